//! Shared utilities for CLI commands

use miette::{IntoDiagnostic, Result};
use tracing::warn;

use crate::core::config::Config;
use crate::core::project::Project;
use crate::core::protocol::{Protocol, ProtocolError};
use crate::core::session::Session;
use crate::core::store::{open_store, Storage};

/// The discovered project together with its effective configuration
pub struct Workspace {
    pub project: Project,
    pub config: Config,
}

impl Workspace {
    /// Discover the project around the current directory and load its config
    pub fn open() -> Result<Self> {
        let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
        let config = Config::load_for(Some(&project)).map_err(|e| miette::miette!("{}", e))?;
        config.validate().into_diagnostic()?;
        Ok(Self { project, config })
    }

    pub fn store(&self) -> Result<Box<dyn Storage>> {
        open_store(&self.config, &self.project).map_err(|e| miette::miette!("{}", e))
    }

    /// The logged-in session; fails when nobody is logged in
    pub fn session(&self) -> Result<Session> {
        Session::require(&self.project).map_err(|e| miette::miette!("{}", e))
    }

    /// The protocol table; a missing file yields an empty protocol
    pub fn protocol(&self) -> Result<Protocol> {
        let path = self.config.protocol_path(&self.project);
        match Protocol::load(&path) {
            Ok(protocol) => Ok(protocol),
            Err(ProtocolError::NotFound(path)) => {
                warn!(path = %path.display(), "protocol file not found, no tasks will be shown");
                Ok(Protocol::default())
            }
            Err(ProtocolError::Yaml(e)) => Err(miette::Report::new(e)),
            Err(e) => Err(miette::miette!("{}", e)),
        }
    }
}
