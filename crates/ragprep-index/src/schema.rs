use serde::Serialize;

pub const DEFAULT_ENGINE: &str = "faiss";
pub const DEFAULT_SPACE_TYPE: &str = "cosinesimil";
pub const DEFAULT_HNSW_M: u32 = 16;
pub const DEFAULT_EF_CONSTRUCTION: u32 = 512;
pub const DEFAULT_EF_SEARCH: u32 = 512;

/// Mapping type of a non-vector field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Keyword,
    Object { enabled: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HnswMethod {
    pub name: String,
    pub engine: String,
    pub space_type: String,
    pub m: u32,
    pub ef_construction: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorField {
    pub dimension: u32,
    pub method: HnswMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarFields {
    pub text: FieldType,
    pub doc_id: FieldType,
    pub title: FieldType,
    pub url: FieldType,
    pub chunk_id: FieldType,
    pub metadata: FieldType,
}

impl Default for ScalarFields {
    fn default() -> Self {
        Self {
            text: FieldType::Text,
            doc_id: FieldType::Keyword,
            title: FieldType::Text,
            url: FieldType::Keyword,
            chunk_id: FieldType::Keyword,
            metadata: FieldType::Object { enabled: true },
        }
    }
}

/// Index settings and mappings for the `embedding` k-NN field plus the
/// record's scalar fields. Serializes to the create-index request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "IndexBody")]
pub struct IndexSchema {
    pub shard_count: u32,
    pub replica_count: u32,
    pub knn_enabled: bool,
    pub ef_search: u32,
    pub vector_field: VectorField,
    pub scalar_fields: ScalarFields,
}

impl IndexSchema {
    pub fn build(
        dimension: u32,
        engine: &str,
        space_type: &str,
        m: u32,
        ef_construction: u32,
        ef_search: u32,
    ) -> Self {
        Self {
            shard_count: 1,
            replica_count: 0,
            knn_enabled: true,
            ef_search,
            vector_field: VectorField {
                dimension,
                method: HnswMethod {
                    name: "hnsw".to_string(),
                    engine: engine.to_string(),
                    space_type: space_type.to_string(),
                    m,
                    ef_construction,
                },
            },
            scalar_fields: ScalarFields::default(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[derive(Serialize)]
struct IndexBody {
    settings: SettingsBody,
    mappings: MappingsBody,
}

#[derive(Serialize)]
struct SettingsBody {
    index: IndexSettings,
}

#[derive(Serialize)]
struct IndexSettings {
    number_of_shards: u32,
    number_of_replicas: u32,
    knn: bool,
    #[serde(rename = "knn.algo_param.ef_search")]
    ef_search: u32,
}

#[derive(Serialize)]
struct MappingsBody {
    properties: Properties,
}

#[derive(Serialize)]
struct Properties {
    embedding: KnnVector,
    text: FieldType,
    doc_id: FieldType,
    title: FieldType,
    url: FieldType,
    chunk_id: FieldType,
    metadata: FieldType,
}

#[derive(Serialize)]
struct KnnVector {
    #[serde(rename = "type")]
    kind: &'static str,
    dimension: u32,
    method: MethodBody,
}

#[derive(Serialize)]
struct MethodBody {
    name: String,
    engine: String,
    space_type: String,
    parameters: HnswParameters,
}

#[derive(Serialize)]
struct HnswParameters {
    m: u32,
    ef_construction: u32,
}

impl From<IndexSchema> for IndexBody {
    fn from(s: IndexSchema) -> Self {
        let method = s.vector_field.method;
        Self {
            settings: SettingsBody {
                index: IndexSettings {
                    number_of_shards: s.shard_count,
                    number_of_replicas: s.replica_count,
                    knn: s.knn_enabled,
                    ef_search: s.ef_search,
                },
            },
            mappings: MappingsBody {
                properties: Properties {
                    embedding: KnnVector {
                        kind: "knn_vector",
                        dimension: s.vector_field.dimension,
                        method: MethodBody {
                            name: method.name,
                            engine: method.engine,
                            space_type: method.space_type,
                            parameters: HnswParameters { m: method.m, ef_construction: method.ef_construction },
                        },
                    },
                    text: s.scalar_fields.text,
                    doc_id: s.scalar_fields.doc_id,
                    title: s.scalar_fields.title,
                    url: s.scalar_fields.url,
                    chunk_id: s.scalar_fields.chunk_id,
                    metadata: s.scalar_fields.metadata,
                },
            },
        }
    }
}
