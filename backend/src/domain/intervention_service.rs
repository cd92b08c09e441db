//! Intervention scheduling and the per-agent event projection.
//!
//! Every successful write re-projects the intervention onto calendar events
//! for the agents of its ticket. The projection is advisory: a failed sync
//! is logged and the write still succeeds.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{
    ClientRepository, InterventionEventSync, InterventionRepository, InterventionScheduling,
    TicketRepository,
};
use crate::domain::validation::{optional_text, required, required_text};
use crate::domain::{
    CalendarEntry, CalendarQuery, Error, Intervention, InterventionEvent, InterventionFilter,
    InterventionInput, InterventionRelations, InterventionStatus, MaterielUsage, NewIntervention,
    Rendu, RenduBook, RenduInput, RenduOwner, Ticket, best_effort, merge_materiels,
};

/// Collaborators of [`InterventionService`].
#[derive(Clone)]
pub struct InterventionServiceDeps {
    pub interventions: Arc<dyn InterventionRepository>,
    pub events: Arc<dyn InterventionEventSync>,
    pub tickets: Arc<dyn TicketRepository>,
    pub clients: Arc<dyn ClientRepository>,
    pub rendus: RenduBook,
}

/// Implements [`InterventionScheduling`].
#[derive(Clone)]
pub struct InterventionService {
    deps: InterventionServiceDeps,
}

impl InterventionService {
    pub fn new(deps: InterventionServiceDeps) -> Self {
        Self { deps }
    }

    async fn find(&self, id: i32) -> Result<Intervention, Error> {
        self.deps
            .interventions
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("intervention {id} not found")))
    }

    async fn ticket(&self, id: i32) -> Result<Ticket, Error> {
        self.deps
            .tickets
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("ticket {id} not found")))
    }

    /// Full row from a create or replace body.
    async fn complete(&self, input: InterventionInput) -> Result<NewIntervention, Error> {
        let ticket_id = required("ticket_id", input.ticket_id)?;
        let titre = required_text("titre", input.titre)?;
        let ticket = self.ticket(ticket_id).await?;
        Ok(NewIntervention {
            ticket_id,
            site_id: input.site_id.or(ticket.site_id),
            demande_id: input.demande_id.or(ticket.demande_id),
            titre,
            description: optional_text(input.description),
            status: input.status.unwrap_or(InterventionStatus::EnAttente),
            date_debut: input.date_debut,
            date_fin: input.date_fin,
            metier: optional_text(input.metier),
            ticket_agent_id: input.ticket_agent_id,
        })
    }

    async fn sync(&self, intervention: &Intervention) {
        if let Some(count) =
            best_effort("intervention event sync", self.deps.events.sync(intervention)).await
        {
            debug!(intervention_id = intervention.id, count, "events synchronised");
        }
    }
}

#[async_trait]
impl InterventionScheduling for InterventionService {
    async fn list_interventions(
        &self,
        filter: InterventionFilter,
    ) -> Result<Vec<Intervention>, Error> {
        Ok(self.deps.interventions.list(&filter).await?)
    }

    async fn get_intervention(&self, id: i32) -> Result<Intervention, Error> {
        self.find(id).await
    }

    async fn calendar(&self, query: CalendarQuery) -> Result<Vec<CalendarEntry>, Error> {
        Ok(self.deps.interventions.calendar(query.matricules()).await?)
    }

    async fn create_intervention(&self, input: InterventionInput) -> Result<Intervention, Error> {
        let intervention = self.complete(input).await?;
        let created = self.deps.interventions.create(&intervention).await?;
        self.sync(&created).await;
        Ok(created)
    }

    async fn replace_intervention(
        &self,
        id: i32,
        input: InterventionInput,
    ) -> Result<Intervention, Error> {
        let intervention = self.complete(input).await?;
        let replaced = self
            .deps
            .interventions
            .replace(id, &intervention)
            .await?
            .ok_or_else(|| Error::not_found(format!("intervention {id} not found")))?;
        self.sync(&replaced).await;
        Ok(replaced)
    }

    async fn patch_intervention(
        &self,
        id: i32,
        input: InterventionInput,
    ) -> Result<Intervention, Error> {
        if input == InterventionInput::default() {
            return Err(Error::invalid_request("no fields to update"));
        }
        if let Some(ticket_id) = input.ticket_id {
            self.ticket(ticket_id).await?;
        }
        let patch = InterventionInput {
            titre: input
                .titre
                .map(|titre| required_text("titre", Some(titre)))
                .transpose()?,
            ..input
        };
        let patched = self
            .deps
            .interventions
            .patch(id, &patch)
            .await?
            .ok_or_else(|| Error::not_found(format!("intervention {id} not found")))?;
        self.sync(&patched).await;
        Ok(patched)
    }

    async fn delete_intervention(&self, id: i32) -> Result<(), Error> {
        if self.deps.interventions.delete(id).await? {
            Ok(())
        } else {
            Err(Error::not_found(format!("intervention {id} not found")))
        }
    }

    async fn events(&self, id: i32) -> Result<Vec<InterventionEvent>, Error> {
        self.find(id).await?;
        Ok(self.deps.interventions.events(id).await?)
    }

    async fn materiels(&self, id: i32) -> Result<Vec<MaterielUsage>, Error> {
        let intervention = self.find(id).await?;
        let direct = self.deps.interventions.direct_materiels(id).await?;
        let requested = self
            .deps
            .interventions
            .requested_materiels(id, intervention.ticket_id)
            .await?;
        Ok(merge_materiels(direct, requested))
    }

    async fn intervention_relations(&self, id: i32) -> Result<InterventionRelations, Error> {
        let intervention = self.find(id).await?;
        let ticket = self.deps.tickets.find(intervention.ticket_id).await?;
        let site = match intervention.site_id {
            Some(site_id) => self.deps.clients.find_site(site_id).await?,
            None => None,
        };
        let direct = self.deps.interventions.direct_materiels(id).await?;
        let requested = self
            .deps
            .interventions
            .requested_materiels(id, intervention.ticket_id)
            .await?;
        Ok(InterventionRelations {
            ticket,
            site,
            events: self.deps.interventions.events(id).await?,
            materiels: merge_materiels(direct, requested),
            rendus: self.deps.rendus.list(RenduOwner::Intervention(id)).await?,
            intervention,
        })
    }

    async fn list_rendus(&self, id: i32) -> Result<Vec<Rendu>, Error> {
        self.find(id).await?;
        self.deps.rendus.list(RenduOwner::Intervention(id)).await
    }

    async fn get_rendu(&self, id: i32, rendu_id: i32) -> Result<Rendu, Error> {
        self.deps
            .rendus
            .get(RenduOwner::Intervention(id), rendu_id)
            .await
    }

    async fn create_rendu(&self, id: i32, input: RenduInput) -> Result<Rendu, Error> {
        self.find(id).await?;
        self.deps
            .rendus
            .create(RenduOwner::Intervention(id), input)
            .await
    }

    async fn update_rendu(
        &self,
        id: i32,
        rendu_id: i32,
        input: RenduInput,
    ) -> Result<Rendu, Error> {
        self.deps
            .rendus
            .update(RenduOwner::Intervention(id), rendu_id, input)
            .await
    }

    async fn delete_rendu(&self, id: i32, rendu_id: i32) -> Result<(), Error> {
        self.deps
            .rendus
            .delete(RenduOwner::Intervention(id), rendu_id)
            .await
    }
}

#[cfg(test)]
#[path = "intervention_service_tests.rs"]
mod tests;
