//! Raw file save.

use crate::{error::StartError, launch::Launched, process::StartRequest};

pub(super) async fn launch(request: &StartRequest) -> Result<Launched, StartError> {
    if request.path.is_empty() {
        return Err(StartError::MissingPath);
    }
    let path = match &request.working_dir {
        Some(dir) => dir.join(&request.path),
        None => request.path.clone().into(),
    };
    tokio::fs::write(&path, &request.body).await?;
    tracing::debug!(id = %request.id, path = %path.display(), "Saved file");
    Ok(Launched::completed(request.working_dir.clone()))
}
