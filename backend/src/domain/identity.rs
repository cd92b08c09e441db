//! Resolution of the agent acting on behalf of a caller.

use crate::domain::ports::AgentDirectory;
use crate::domain::{Caller, Error};

/// Matricule of the caller's agent record.
///
/// The session identity wins; otherwise the agent is looked up by e-mail.
pub async fn resolve_matricule(
    caller: &Caller,
    agents: &dyn AgentDirectory,
) -> Result<Option<String>, Error> {
    if let Some(matricule) = caller
        .matricule
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
    {
        return Ok(Some(matricule.to_owned()));
    }
    let Some(email) = caller.email() else {
        return Ok(None);
    };
    Ok(agents
        .find_by_email(email)
        .await?
        .map(|agent| agent.matricule))
}
