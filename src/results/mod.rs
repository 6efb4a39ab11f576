pub mod result_store;

pub use result_store::{
    parse_artifact, render_artifact, ResultArtifact, ResultStore, ARTIFACT_PREFIX, RESULTS_ROUTE,
};
