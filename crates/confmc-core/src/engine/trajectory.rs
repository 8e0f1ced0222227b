use super::config::{OutputConfig, StepRange};
use super::error::EngineError;
use super::state::McStep;
use crate::core::io::frame::Frame;
use crate::core::io::traits::FrameFile;
use crate::core::io::xyz::XyzFile;
use crate::core::models::molecule::Molecule;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const GROUND_STATE_FILE: &str = "gs.xyz";

pub fn step_file_name(index: usize) -> String {
    format!("step_{:04}.xyz", index)
}

/// Persists one trajectory as a flat directory of extended XYZ frames:
/// `gs.xyz` followed by `step_0000.xyz`, `step_0001.xyz`, ...
///
/// The directory is created or reused on construction and only ever added to.
#[derive(Debug)]
pub struct TrajectoryWriter {
    directory: PathBuf,
    atomic_numbers: Vec<u8>,
}

impl TrajectoryWriter {
    /// `{root}/{model_tag}/{range label}/{sample_index:04}`.
    pub fn directory_for(output: &OutputConfig, range: &StepRange, sample_index: usize) -> PathBuf {
        output
            .root
            .join(&output.model_tag)
            .join(range.label())
            .join(format!("{:04}", sample_index))
    }

    pub fn create(directory: PathBuf, molecule: &Molecule) -> Result<Self, EngineError> {
        fs::create_dir_all(&directory).map_err(|e| EngineError::Io {
            path: directory.to_string_lossy().to_string(),
            source: e,
        })?;
        debug!(directory = %directory.display(), "Trajectory directory ready.");
        Ok(Self {
            directory,
            atomic_numbers: molecule.atomic_numbers().to_vec(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn write_ground_state(&self, molecule: &Molecule) -> Result<PathBuf, EngineError> {
        let charges = molecule
            .charge_offsets()
            .into_iter()
            .map(f64::from)
            .collect();
        let frame = Frame::new(
            self.atomic_numbers.clone(),
            molecule.positions().to_vec(),
            charges,
        );
        self.write_frame(&frame, GROUND_STATE_FILE)
    }

    pub fn write_step(&self, step: &McStep) -> Result<PathBuf, EngineError> {
        let frame = Frame::new(
            self.atomic_numbers.clone(),
            step.geometry.clone(),
            step.charge_offsets.iter().copied().map(f64::from).collect(),
        );
        self.write_frame(&frame, &step_file_name(step.index))
    }

    fn write_frame(&self, frame: &Frame, file_name: &str) -> Result<PathBuf, EngineError> {
        let path = self.directory.join(file_name);
        XyzFile::write_to_path(frame, &path).map_err(|e| EngineError::Xyz {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use tempfile::tempdir;

    fn hydrogen_fluoride() -> Molecule {
        Molecule::new(
            vec![9, 1],
            vec![4, 0],
            vec![9, 1],
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.92, 0.0, 0.0)],
        )
        .unwrap()
    }

    #[test]
    fn directory_layout_combines_tag_range_and_padded_index() {
        let output = OutputConfig {
            root: PathBuf::from("/data/mc"),
            model_tag: "edm_qm9-e5150".to_string(),
        };
        let dir = TrajectoryWriter::directory_for(&output, &StepRange::default(), 7);
        assert_eq!(dir, PathBuf::from("/data/mc/edm_qm9-e5150/T65-64/0007"));
    }

    #[test]
    fn step_file_names_are_zero_padded() {
        assert_eq!(step_file_name(0), "step_0000.xyz");
        assert_eq!(step_file_name(42), "step_0042.xyz");
        assert_eq!(step_file_name(4999), "step_4999.xyz");
    }

    #[test]
    fn create_reuses_existing_directory_without_clearing() {
        let root = tempdir().unwrap();
        let dir = root.path().join("a").join("0001");
        let mol = hydrogen_fluoride();

        let writer = TrajectoryWriter::create(dir.clone(), &mol).unwrap();
        writer.write_ground_state(&mol).unwrap();

        let again = TrajectoryWriter::create(dir.clone(), &mol).unwrap();
        assert_eq!(again.directory(), dir.as_path());
        assert!(dir.join(GROUND_STATE_FILE).is_file());
    }

    #[test]
    fn ground_state_carries_charge_offsets() {
        let root = tempdir().unwrap();
        let mol = hydrogen_fluoride();
        let writer = TrajectoryWriter::create(root.path().to_path_buf(), &mol).unwrap();
        let path = writer.write_ground_state(&mol).unwrap();

        let frame = XyzFile::read_from_path(&path).unwrap();
        assert_eq!(frame.atomic_numbers, vec![9, 1]);
        assert_eq!(frame.charges, vec![0.0, 0.0]);
    }

    #[test]
    fn step_frames_use_molecule_identity_and_step_geometry() {
        let root = tempdir().unwrap();
        let mol = hydrogen_fluoride();
        let writer = TrajectoryWriter::create(root.path().to_path_buf(), &mol).unwrap();
        let step = McStep {
            index: 3,
            geometry: vec![Point3::new(0.1, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)],
            charge_offsets: vec![0, -1],
            consistent: true,
            mismatches: 0,
            intermediate_mismatches: 0,
        };

        let path = writer.write_step(&step).unwrap();
        assert!(path.ends_with("step_0003.xyz"));
        let frame = XyzFile::read_from_path(&path).unwrap();
        assert_eq!(frame.atomic_numbers, vec![9, 1]);
        assert_eq!(frame.positions, step.geometry);
        assert_eq!(frame.charges, vec![0.0, -1.0]);
    }

    #[test]
    fn create_fails_when_path_is_a_file() {
        let root = tempdir().unwrap();
        let blocker = root.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let err = TrajectoryWriter::create(blocker.join("0000"), &hydrogen_fluoride()).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }
}
