//! Domain primitives, aggregates and services.
//!
//! Purpose: define the field-service model (clients, demandes, tickets,
//! interventions, work orders, messages) and the services enforcing its
//! lifecycle rules. Nothing here knows about HTTP or SQL; adapters reach the
//! domain through [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic failure payload.
//! - Caller: identity of the user performing a request.
//! - The aggregates and their input/filter shapes.
//! - One service per driving port.

pub mod assignment;
pub mod audit;
pub mod auth;
pub mod best_effort;
pub mod caller;
pub mod chef_policy;
pub mod client;
pub mod client_portal_service;
pub mod conversation;
pub mod error;
pub mod identity;
pub mod intervention;
pub mod intervention_service;
pub mod login;
pub mod messaging;
pub mod messaging_service;
pub mod ports;
pub mod reference;
pub mod rendu;
pub mod rendu_book;
pub mod status;
pub mod ticket;
pub mod ticket_service;
pub mod trace_id;
pub mod travaux;
pub mod travaux_service;
pub mod upload;
pub mod validation;

pub use self::assignment::{
    AgentAssignment, AgentAssignmentInput, NewAgentAssignment, Rating, Responsable,
    ResponsableInput, Satisfaction, SatisfactionInput,
};
pub use self::audit::{AUDIT_DEMANDE, AUDIT_TICKET, AUDIT_TRAVAUX, AuditAction, AuditEntry};
pub use self::auth::{LoginCredentials, LoginValidationError, UserAccount};
pub use self::best_effort::best_effort;
pub use self::caller::{Caller, ROLE_ADMIN, ROLE_AGENT, ROLE_CLIENT};
pub use self::chef_policy::AgentChefAssertion;
pub use self::client::{
    Client, ConversionOutcome, ConversionResult, DeletedDemande, Demande, DemandeFilter,
    DemandeInput, DemandePatch, DemandeQuery, DemandeStatusInput, JustificationInput,
    NewClientAccount, NewDemande, NewSite, RegisterClientRequest, RegistrationOutcome, Site,
    SiteInput, SitePatch, SiteRelations, SoftDeleteOutcome,
};
pub use self::client_portal_service::{ClientPortalDeps, ClientPortalService};
pub use self::conversation::{ConversationScope, direct_conversation_id};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::intervention::{
    CalendarEntry, CalendarProps, CalendarQuery, Intervention, InterventionEvent,
    InterventionFilter, InterventionInput, InterventionRelations, NewIntervention,
};
pub use self::intervention_service::{InterventionService, InterventionServiceDeps};
pub use self::login::PasswordLoginService;
pub use self::messaging::{
    AttachmentMeta, ConversationCreated, ConversationInput, ConversationSummary, Message,
    MessageContext, NewMessage, SendMessageInput, StoredAttachment,
};
pub use self::messaging_service::{MessagingService, MessagingServiceDeps};
pub use self::reference::{
    Affaire, Agent, Doe, MaterielSource, MaterielUsage, merge_materiels,
};
pub use self::rendu::{
    DocumentMeta, ImageMeta, NewRendu, Rendu, RenduInput, RenduOwner, RenduPatch,
};
pub use self::rendu_book::RenduBook;
pub use self::status::{
    DemandeStatus, InterventionEventStatus, InterventionStatus, ResponsableRole, TicketEtat,
    TravauxEtat, TravauxPriorite, UnknownStatus, fold_status,
};
pub use self::ticket::{
    Assignment, NewResponsableChange, NewTicket, ResponsableChange, TakeOutcome, Ticket,
    TicketFilter, TicketInput, TicketPatch, TicketRelations, TicketUpdate,
};
pub use self::ticket_service::{TicketService, TicketServiceDeps};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::travaux::{
    NewTache, NewTravaux, NewTravauxMateriel, Tache, TacheInput, Travaux, TravauxFilter,
    TravauxInput, TravauxMateriel, TravauxMaterielInput, TravauxMaterielPatch, TravauxRelations,
};
pub use self::travaux_service::{TravauxService, TravauxServiceDeps};
pub use self::upload::{FileInput, FileUpload, decode_files};

