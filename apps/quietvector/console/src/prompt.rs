use std::io::{self, BufRead, Write};

/// Line-oriented prompts over any reader/writer pair.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask for one line. `None` at end of input.
    pub fn ask(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Ask with a default used for blank answers.
    pub fn ask_or(&mut self, label: &str, default: &str) -> io::Result<Option<String>> {
        Ok(self
            .ask(&format!("{label} [{default}]"))?
            .map(|answer| if answer.is_empty() { default.to_string() } else { answer }))
    }

    pub fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }
}

impl Prompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}
