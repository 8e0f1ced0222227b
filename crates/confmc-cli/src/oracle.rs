use confmc::core::checkpoint::Checkpoint;
use confmc::engine::encoder::PaddedTensorBundle;
use confmc::engine::oracle::{DiffusionChain, DiffusionOracle, OracleError, OracleRequest};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tracing::{debug, info, warn};

#[derive(Serialize)]
struct Handshake<'a> {
    checkpoint: &'a Checkpoint,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    num_atoms: usize,
    start_t: u32,
    end_t: u32,
    seed: u64,
    anchor: &'a PaddedTensorBundle,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireResponse {
    Chain { chain: DiffusionChain },
    Error { error: String },
}

/// A sampler process that stays alive for the whole run and speaks JSON
/// Lines: one checkpoint handshake, then one request and one response line
/// per refinement call.
pub struct ProcessOracle {
    program: String,
    child: Child,
    stdin: BufWriter<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl ProcessOracle {
    pub fn spawn(command: &[String], checkpoint: &Checkpoint) -> Result<Self, OracleError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| OracleError::Unavailable("sampler command is empty".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| OracleError::Unavailable(format!("failed to start '{}': {}", program, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| OracleError::Unavailable("sampler stdin is not piped".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| OracleError::Unavailable("sampler stdout is not piped".to_string()))?;

        let mut oracle = Self {
            program: program.clone(),
            child,
            stdin: BufWriter::new(stdin),
            stdout: BufReader::new(stdout),
        };
        oracle.send(&Handshake { checkpoint })?;
        info!(
            sampler = %oracle.program,
            pid = oracle.child.id(),
            checkpoint = %checkpoint.tag(),
            "Sampler process started."
        );
        Ok(oracle)
    }

    fn send<T: Serialize>(&mut self, message: &T) -> Result<(), OracleError> {
        serde_json::to_writer(&mut self.stdin, message)
            .map_err(|e| OracleError::Protocol(format!("failed to encode request: {}", e)))?;
        self.stdin.write_all(b"\n")?;
        self.stdin.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> Result<WireResponse, OracleError> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(OracleError::Unavailable(format!(
                "'{}' closed its output",
                self.program
            )));
        }
        serde_json::from_str(&line).map_err(|e| OracleError::Protocol(e.to_string()))
    }
}

impl DiffusionOracle for ProcessOracle {
    fn refine(&mut self, request: &OracleRequest<'_>) -> Result<DiffusionChain, OracleError> {
        self.send(&WireRequest {
            num_atoms: request.num_atoms,
            start_t: request.range.start(),
            end_t: request.range.end(),
            seed: request.seed,
            anchor: request.anchor,
        })?;
        match self.receive()? {
            WireResponse::Chain { chain } => {
                debug!(snapshots = chain.len(), "Sampler returned a chain.");
                Ok(chain)
            }
            WireResponse::Error { error } => Err(OracleError::Backend(error)),
        }
    }
}

impl Drop for ProcessOracle {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            debug!("Sampler process already gone: {}", e);
        }
        if let Err(e) = self.child.wait() {
            warn!("Failed to reap sampler process: {}", e);
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use confmc::engine::config::StepRange;
    use std::fs;
    use tempfile::tempdir;

    fn checkpoint() -> (tempfile::TempDir, Checkpoint) {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(Checkpoint::args_file_name(1)), "").unwrap();
        fs::write(dir.path().join("generative_model_1.npy"), b"w").unwrap();
        let checkpoint = Checkpoint::load(dir.path(), 1).unwrap();
        (dir, checkpoint)
    }

    fn shell(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    fn request_for(anchor: &PaddedTensorBundle) -> OracleRequest<'_> {
        OracleRequest {
            anchor,
            num_atoms: 1,
            range: StepRange::default(),
            seed: 9,
        }
    }

    #[test]
    fn chain_response_is_decoded() {
        let (_dir, checkpoint) = checkpoint();
        let script = r#"read handshake; while read request; do echo '{"chain":[{"positions":[[1,2,3]],"one_hot":[[0,1]],"charges":[[6]]}]}'; done"#;
        let mut oracle = ProcessOracle::spawn(&shell(script), &checkpoint).unwrap();

        let anchor = PaddedTensorBundle::zeros(1, 2);
        let chain = oracle.refine(&request_for(&anchor)).unwrap();
        assert_eq!(chain.len(), 1);
        let snapshot = chain.first().unwrap();
        assert_eq!(snapshot.decode_type_indices(1), vec![1]);
        assert_eq!(snapshot.rounded_charges(1), vec![6]);

        let again = oracle.refine(&request_for(&anchor)).unwrap();
        assert_eq!(again, chain);
    }

    #[test]
    fn error_response_becomes_backend_error() {
        let (_dir, checkpoint) = checkpoint();
        let script = r#"read handshake; while read request; do echo '{"error":"cuda out of memory"}'; done"#;
        let mut oracle = ProcessOracle::spawn(&shell(script), &checkpoint).unwrap();

        let anchor = PaddedTensorBundle::zeros(1, 2);
        let err = oracle.refine(&request_for(&anchor)).unwrap_err();
        assert!(matches!(err, OracleError::Backend(msg) if msg == "cuda out of memory"));
    }

    #[test]
    fn malformed_response_is_a_protocol_error() {
        let (_dir, checkpoint) = checkpoint();
        let script = "read handshake; while read request; do echo 'not json'; done";
        let mut oracle = ProcessOracle::spawn(&shell(script), &checkpoint).unwrap();

        let anchor = PaddedTensorBundle::zeros(1, 2);
        let err = oracle.refine(&request_for(&anchor)).unwrap_err();
        assert!(matches!(err, OracleError::Protocol(_)));
    }

    #[test]
    fn exited_sampler_is_reported() {
        let (_dir, checkpoint) = checkpoint();
        let anchor = PaddedTensorBundle::zeros(1, 2);
        let outcome = ProcessOracle::spawn(&shell("exit 0"), &checkpoint)
            .and_then(|mut oracle| oracle.refine(&request_for(&anchor)));
        assert!(outcome.is_err());
    }

    #[test]
    fn empty_or_missing_command_is_unavailable() {
        let (_dir, checkpoint) = checkpoint();
        assert!(matches!(
            ProcessOracle::spawn(&[], &checkpoint),
            Err(OracleError::Unavailable(_))
        ));
        assert!(matches!(
            ProcessOracle::spawn(&["/nonexistent/sampler-binary".to_string()], &checkpoint),
            Err(OracleError::Unavailable(_))
        ));
    }
}
