//! Builders wiring Diesel adapters into the domain services behind
//! [`HttpState`].

use std::sync::Arc;

use actix_web::web;

use fieldops::domain::ports::{
    AccountRepository, AgentDirectory, AuditLog, ChefAssertion, ClientRepository,
    InterventionRepository, PasswordHasher, ReferenceRepository, TicketRepository,
    TravauxRepository,
};
use fieldops::domain::{
    AgentChefAssertion, ClientPortalDeps, ClientPortalService, InterventionService,
    InterventionServiceDeps, MessagingService, MessagingServiceDeps, PasswordLoginService,
    RenduBook, TicketService, TicketServiceDeps, TravauxService, TravauxServiceDeps,
};
use fieldops::inbound::http::state::HttpState;
use fieldops::outbound::persistence::{
    DbPool, DieselAccountRepository, DieselAgentDirectory, DieselAuditLog,
    DieselClientRepository, DieselInterventionEventSync, DieselInterventionRepository,
    DieselMessagingRepository, DieselReferenceRepository, DieselRenduRepository,
    DieselTicketRepository, DieselTravauxRepository,
};
use fieldops::outbound::security::Argon2PasswordHasher;

/// Driven adapters shared by several services.
struct Adapters {
    accounts: Arc<dyn AccountRepository>,
    agents: Arc<dyn AgentDirectory>,
    audit: Arc<dyn AuditLog>,
    clients: Arc<dyn ClientRepository>,
    hasher: Arc<dyn PasswordHasher>,
    interventions: Arc<dyn InterventionRepository>,
    references: Arc<dyn ReferenceRepository>,
    tickets: Arc<dyn TicketRepository>,
    travaux: Arc<dyn TravauxRepository>,
    chef: Arc<dyn ChefAssertion>,
    rendus: RenduBook,
}

impl Adapters {
    fn new(pool: &DbPool, chef_fonction: Option<String>) -> Self {
        let agents: Arc<dyn AgentDirectory> = Arc::new(DieselAgentDirectory::new(pool.clone()));
        Self {
            accounts: Arc::new(DieselAccountRepository::new(pool.clone())),
            chef: Arc::new(AgentChefAssertion::new(agents.clone(), chef_fonction)),
            agents,
            audit: Arc::new(DieselAuditLog::new(pool.clone())),
            clients: Arc::new(DieselClientRepository::new(pool.clone())),
            hasher: Arc::new(Argon2PasswordHasher::default()),
            interventions: Arc::new(DieselInterventionRepository::new(pool.clone())),
            references: Arc::new(DieselReferenceRepository::new(pool.clone())),
            tickets: Arc::new(DieselTicketRepository::new(pool.clone())),
            travaux: Arc::new(DieselTravauxRepository::new(pool.clone())),
            rendus: RenduBook::new(Arc::new(DieselRenduRepository::new(pool.clone()))),
        }
    }
}

/// Build the shared HTTP state from the database pool.
pub(super) fn build_http_state(pool: &DbPool, chef_fonction: Option<String>) -> web::Data<HttpState> {
    let adapters = Adapters::new(pool, chef_fonction);

    let login = PasswordLoginService::new(
        adapters.accounts.clone(),
        adapters.agents.clone(),
        adapters.hasher.clone(),
    );
    let clients = ClientPortalService::new(ClientPortalDeps {
        clients: adapters.clients.clone(),
        tickets: adapters.tickets.clone(),
        travaux: adapters.travaux.clone(),
        references: adapters.references.clone(),
        agents: adapters.agents.clone(),
        audit: adapters.audit.clone(),
        hasher: adapters.hasher.clone(),
    });
    let tickets = TicketService::new(TicketServiceDeps {
        tickets: adapters.tickets.clone(),
        clients: adapters.clients.clone(),
        interventions: adapters.interventions.clone(),
        references: adapters.references.clone(),
        agents: adapters.agents.clone(),
        chef: adapters.chef.clone(),
        audit: adapters.audit.clone(),
    });
    let travaux = TravauxService::new(TravauxServiceDeps {
        travaux: adapters.travaux.clone(),
        clients: adapters.clients.clone(),
        references: adapters.references.clone(),
        agents: adapters.agents.clone(),
        chef: adapters.chef.clone(),
        audit: adapters.audit.clone(),
        rendus: adapters.rendus.clone(),
    });
    let interventions = InterventionService::new(InterventionServiceDeps {
        interventions: adapters.interventions.clone(),
        events: Arc::new(DieselInterventionEventSync::new(pool.clone())),
        tickets: adapters.tickets.clone(),
        clients: adapters.clients.clone(),
        rendus: adapters.rendus.clone(),
    });
    let messaging = MessagingService::new(MessagingServiceDeps {
        messages: Arc::new(DieselMessagingRepository::new(pool.clone())),
        accounts: adapters.accounts,
        tickets: adapters.tickets,
        clients: adapters.clients,
    });

    web::Data::new(HttpState {
        login: Arc::new(login),
        clients: Arc::new(clients),
        tickets: Arc::new(tickets),
        travaux: Arc::new(travaux),
        interventions: Arc::new(interventions),
        messaging: Arc::new(messaging),
    })
}
