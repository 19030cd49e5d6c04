//! Finding a runnable scanner binary

use crate::GatherError;
use log::debug;
use std::process::Stdio;
use tokio::process::Command;

/// First candidate that can be started with `-V`
pub async fn locate(candidates: &[String]) -> crate::Result<String> {
    for path in candidates {
        let probe = Command::new(path)
            .arg("-V")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await;

        match probe {
            Ok(_) => {
                debug!("using scanner at {}", path);
                return Ok(path.clone());
            }
            Err(e) => debug!("scanner candidate {} unusable: {}", path, e),
        }
    }

    Err(GatherError::ScannerNotFound {
        candidates: candidates.to_vec(),
    })
}
