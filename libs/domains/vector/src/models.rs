use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use utoipa::openapi::schema::{KnownFormat, ObjectBuilder, OneOfBuilder, Schema, SchemaFormat, Type};
use utoipa::openapi::RefOr;
use utoipa::{PartialSchema, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{validate_payload, validate_point_dimensions, validate_vector};

/// Point identifier accepted by Qdrant: an unsigned integer or a UUID.
///
/// Numeric strings (`"42"`) deserialize as integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointId {
    Num(u64),
    Uuid(Uuid),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Num(n) => write!(f, "{n}"),
            PointId::Uuid(u) => write!(f, "{u}"),
        }
    }
}

impl From<u64> for PointId {
    fn from(value: u64) -> Self {
        PointId::Num(value)
    }
}

impl From<Uuid> for PointId {
    fn from(value: Uuid) -> Self {
        PointId::Uuid(value)
    }
}

impl std::str::FromStr for PointId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<u64>() {
            return Ok(PointId::Num(n));
        }
        Uuid::parse_str(s)
            .map(PointId::Uuid)
            .map_err(|_| "Point id must be an unsigned integer or UUID".to_string())
    }
}

impl PartialSchema for PointId {
    fn schema() -> RefOr<Schema> {
        let num = ObjectBuilder::new()
            .schema_type(Type::Integer)
            .format(Some(SchemaFormat::KnownFormat(KnownFormat::Int64)))
            .build();
        let uuid = ObjectBuilder::new()
            .schema_type(Type::String)
            .format(Some(SchemaFormat::KnownFormat(KnownFormat::Uuid)))
            .build();

        RefOr::T(Schema::OneOf(
            OneOfBuilder::new()
                .item(Schema::Object(num))
                .item(Schema::Object(uuid))
                .description(Some("Unsigned integer or UUID"))
                .build(),
        ))
    }
}

impl ToSchema for PointId {
    fn name() -> Cow<'static, str> {
        Cow::Borrowed("PointId")
    }
}

impl Serialize for PointId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PointId::Num(n) => serializer.serialize_u64(*n),
            PointId::Uuid(u) => serializer.collect_str(u),
        }
    }
}

impl<'de> Deserialize<'de> for PointId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u64),
            Text(String),
            Other(serde_json::Value),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Ok(PointId::Num(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Raw::Other(_) => Err(serde::de::Error::custom(
                "Point id must be an unsigned integer or UUID",
            )),
        }
    }
}

/// Similarity metric of a collection's vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum Distance {
    #[default]
    Cosine,
    Dot,
    Euclid,
}

impl Distance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Distance::Cosine => "Cosine",
            Distance::Dot => "Dot",
            Distance::Euclid => "Euclid",
        }
    }
}

impl std::str::FromStr for Distance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Distance::Cosine),
            "dot" => Ok(Distance::Dot),
            "euclid" => Ok(Distance::Euclid),
            other => Err(format!("unknown distance '{other}' (Cosine, Dot or Euclid)")),
        }
    }
}

// ===== Collections =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCollectionRequest {
    #[validate(length(min = 1, max = 255))]
    #[schema(example = "docs")]
    pub name: String,
    #[validate(range(min = 1))]
    #[schema(example = 1536)]
    pub vectors_size: u64,
    #[serde(default)]
    pub distance: Distance,
    /// HNSW build-time neighbour candidates
    #[validate(range(min = 4, max = 4096))]
    pub ef_construct: Option<u32>,
    /// HNSW edges per node
    #[validate(range(min = 4, max = 128))]
    pub m: Option<u32>,
}

/// What the vector store reports about one collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectionInfo {
    pub status: String,
    pub points_count: u64,
    pub vectors_count: Option<u64>,
    pub vector_size: Option<u64>,
    pub distance: Option<String>,
}

impl CollectionInfo {
    /// Older Qdrant releases report `vectors_count`; newer ones only points.
    /// Collections here hold one unnamed vector per point.
    pub fn effective_vectors_count(&self) -> u64 {
        self.vectors_count.unwrap_or(self.points_count)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CollectionSummary {
    pub name: String,
    pub points_count: u64,
    pub vectors_count: u64,
    #[schema(example = "green")]
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CollectionsResponse {
    pub collections: Vec<CollectionSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CollectionDetails {
    pub name: String,
    /// Exact point count
    pub vectors_count: u64,
    pub vector_size: u64,
    #[schema(example = "Cosine")]
    pub distance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateCollectionResponse {
    pub name: String,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteCollectionResponse {
    pub deleted: bool,
}

// ===== Points =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Point {
    pub id: PointId,
    #[validate(custom(function = "validate_vector"))]
    pub vector: Vec<f32>,
    #[validate(custom(function = "validate_payload"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub payload: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_point_dimensions"))]
pub struct InsertVectorsRequest {
    #[validate(length(min = 1))]
    pub collection: String,
    #[validate(length(min = 1), nested)]
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InsertVectorsResponse {
    pub inserted: usize,
}

fn default_limit() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct SearchRequest {
    #[validate(length(min = 1))]
    pub collection: String,
    #[validate(custom(function = "validate_vector"))]
    pub vector: Vec<f32>,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u32,
    #[serde(default = "default_true")]
    pub with_payload: bool,
}

/// One search hit as returned by the vector store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoredPoint {
    pub id: PointId,
    pub score: f32,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchHit {
    /// Point id rendered as a string
    pub id: String,
    pub score: f32,
    #[schema(value_type = Option<Object>)]
    pub payload: Option<serde_json::Value>,
}

impl From<ScoredPoint> for SearchHit {
    fn from(point: ScoredPoint) -> Self {
        Self {
            id: point.id.to_string(),
            score: point.score,
            payload: point.payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct DeletePointsRequest {
    #[validate(length(min = 1))]
    pub collection: String,
    #[validate(length(min = 1))]
    pub ids: Vec<PointId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeletePointsResponse {
    pub deleted: usize,
}

// ===== Stats =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatsItem {
    pub name: String,
    pub points_count: u64,
    pub vectors_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub collections: usize,
    pub total_points: u64,
    pub items: Vec<StatsItem>,
}

// ===== Snapshots =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SnapshotDescription {
    pub name: String,
    #[serde(default)]
    pub creation_time: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SnapshotListResponse {
    pub result: Vec<SnapshotDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RestoreResponse {
    pub op_id: String,
    #[schema(value_type = Object)]
    pub result: serde_json::Value,
}
