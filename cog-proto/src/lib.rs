//! Protobuf contract for the Cog gRPC service, plus conversions between
//! prost well-known types and `serde_json` values.

tonic::include_proto!("automaton.cog");

pub mod value;
