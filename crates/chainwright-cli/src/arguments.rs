use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Command line arguments for the deployment runner.
#[derive(clap::Parser)]
pub struct Arguments {
    /// Name of the target network. Deployments are recorded per network,
    /// so the same manifest can be rolled out to several networks from
    /// one state file.
    #[clap(long, env)]
    pub network: String,

    /// Path to the deployment manifest.
    #[clap(long, env, default_value = "manifests/localhost.json")]
    pub manifest: PathBuf,

    /// Path to the JSON state file recording deployed addresses.
    #[clap(long, env, default_value = "deployments.json")]
    pub state_file: PathBuf,

    /// Deploy only these artifacts (comma separated). Transitive
    /// dependencies are always included.
    #[clap(long, env, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Redeploy artifacts that already have a recorded address.
    #[clap(long, env)]
    pub force: bool,

    /// Keep deploying independent artifacts after a failure.
    #[clap(long, env)]
    pub continue_on_error: bool,

    /// Submission attempts per artifact before giving up.
    #[clap(long, env, default_value = "3")]
    pub max_attempts: u32,

    /// Run against an in-memory state store, leaving the state file
    /// untouched.
    #[clap(long, env)]
    pub dry_run: bool,
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "network: {}", self.network)?;
        writeln!(f, "manifest: {}", self.manifest.display())?;
        writeln!(f, "state_file: {}", self.state_file.display())?;
        writeln!(f, "only: {:?}", self.only)?;
        writeln!(f, "force: {}", self.force)?;
        writeln!(f, "continue_on_error: {}", self.continue_on_error)?;
        writeln!(f, "max_attempts: {}", self.max_attempts)?;
        writeln!(f, "dry_run: {}", self.dry_run)?;
        Ok(())
    }
}
