use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{core::plan::Plan, prelude::*, scheduler::ports::PlanStore};

/// JSON file with the active plan.
pub struct PlanFile {
    path: PathBuf,
}

impl PlanFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PlanStore for PlanFile {
    #[instrument(skip_all, fields(path = %self.path.display()), name = "Reading the plan…")]
    fn load(&self) -> Result<Option<Plan>> {
        if !self.path.is_file() {
            info!("no plan has been saved yet");
            return Ok(None);
        }
        let contents = fs::read(&self.path)
            .with_context(|| format!("failed to read `{}`", self.path.display()))?;
        let plan = serde_json::from_slice::<Plan>(&contents)
            .with_context(|| format!("failed to deserialize `{}`", self.path.display()))?;
        info!(n_charge_windows = plan.charge.len(), n_discharge_quarters = plan.discharge.len());
        Ok(Some(plan))
    }

    /// Write the plan next to the file, flush it to the disk, and swap them.
    #[instrument(skip_all, fields(path = %self.path.display()), name = "Writing the plan…")]
    fn save(&mut self, plan: &Plan) -> Result {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create `{}`", parent.display()))?;
        }
        let temporary_path = self.path.with_extension("tmp");
        let mut file = File::create(&temporary_path)
            .with_context(|| format!("failed to create `{}`", temporary_path.display()))?;
        file.write_all(&serde_json::to_vec_pretty(plan)?)
            .with_context(|| format!("failed to write `{}`", temporary_path.display()))?;
        file.sync_all()
            .with_context(|| format!("failed to flush `{}`", temporary_path.display()))?;
        drop(file);
        fs::rename(&temporary_path, &self.path)
            .with_context(|| format!("failed to replace `{}`", self.path.display()))?;
        Ok(())
    }
}
