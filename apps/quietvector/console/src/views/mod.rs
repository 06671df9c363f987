//! One module per console tab. Views validate input locally, make one or
//! two API calls and return the text to print.

pub mod collections;
pub mod insert;
pub mod search;
pub mod security;
pub mod shell;
pub mod snapshots;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing {
    use crate::client::ApiClient;
    use crate::session::Session;
    use wiremock::MockServer;

    pub fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), None)
            .unwrap()
            .with_session(Session {
                username: "admin".to_string(),
                access_token: "tok".to_string(),
                csrf_token: "csrf".to_string(),
            })
    }
}
