//! Chef eligibility backed by the agent directory.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{AgentDirectory, ChefAssertion};
use crate::domain::{Agent, Error};

/// An agent is a chef when flagged admin or when holding the configured
/// function. Without a configured function every known agent qualifies.
#[derive(Clone)]
pub struct AgentChefAssertion {
    agents: Arc<dyn AgentDirectory>,
    fonction: Option<String>,
}

impl AgentChefAssertion {
    pub fn new(agents: Arc<dyn AgentDirectory>, fonction: Option<String>) -> Self {
        Self { agents, fonction }
    }
}

#[async_trait]
impl ChefAssertion for AgentChefAssertion {
    async fn assert_chef(&self, matricule: &str) -> Result<Agent, Error> {
        let agent = self
            .agents
            .find_by_matricule(matricule)
            .await?
            .ok_or_else(|| Error::not_found(format!("agent {matricule} not found")))?;
        if agent.admin {
            return Ok(agent);
        }
        match self.fonction.as_deref() {
            None => Ok(agent),
            Some(fonction) if self.agents.has_fonction(matricule, fonction).await? => Ok(agent),
            Some(_) => Err(Error::forbidden(format!(
                "agent {matricule} is not allowed to be responsable"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockAgentDirectory;
    use rstest::rstest;

    fn agent(admin: bool) -> Agent {
        Agent {
            matricule: "C9".into(),
            nom: "Durand".into(),
            prenom: Some("Léa".into()),
            email: None,
            user_id: None,
            admin,
        }
    }

    fn directory(found: Option<Agent>, has_fonction: bool) -> MockAgentDirectory {
        let mut agents = MockAgentDirectory::new();
        agents
            .expect_find_by_matricule()
            .return_once(move |_| Ok(found));
        agents
            .expect_has_fonction()
            .returning(move |_, _| Ok(has_fonction));
        agents
    }

    #[rstest]
    #[case(Some(agent(false)), true, Some("chef"), None)]
    #[case(Some(agent(false)), false, Some("chef"), Some(ErrorCode::Forbidden))]
    #[case(Some(agent(true)), false, Some("chef"), None)]
    #[case(Some(agent(false)), false, None, None)]
    #[case(None, true, Some("chef"), Some(ErrorCode::NotFound))]
    #[tokio::test]
    async fn chef_rules(
        #[case] found: Option<Agent>,
        #[case] has_fonction: bool,
        #[case] fonction: Option<&str>,
        #[case] expected: Option<ErrorCode>,
    ) {
        let assertion = AgentChefAssertion::new(
            Arc::new(directory(found, has_fonction)),
            fonction.map(str::to_owned),
        );
        let outcome = assertion.assert_chef("C9").await;
        assert_eq!(outcome.err().map(|err| err.code()), expected);
    }
}
