//! Closed status vocabularies stored as text columns.
//!
//! Every enum serialises to the exact text persisted in PostgreSQL. Parsing
//! is tolerant of case, accents, spaces and hyphens so that values typed by
//! humans ("En cours", "terminé") still land on a canonical variant.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Raised when text does not name any variant of a status vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value `{value}`")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownStatus {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Fold free text into a comparison key.
///
/// Accents are stripped, the text is trimmed and lower-cased, and runs of
/// spaces, hyphens or underscores collapse to a single `_`.
///
/// # Examples
/// ```
/// use fieldops::domain::fold_status;
///
/// assert_eq!(fold_status("  En cours de Traitement "), "en_cours_de_traitement");
/// assert_eq!(fold_status("Rejetée"), "rejetee");
/// ```
pub fn fold_status(raw: &str) -> String {
    let mut folded = String::with_capacity(raw.len());
    let mut pending_separator = false;
    for ch in raw.trim().chars().flat_map(char::to_lowercase) {
        if matches!(ch, ' ' | '-' | '_' | '\t') {
            pending_separator = !folded.is_empty();
            continue;
        }
        if pending_separator {
            folded.push('_');
            pending_separator = false;
        }
        match ch {
            'à' | 'â' | 'ä' | 'á' => folded.push('a'),
            'é' | 'è' | 'ê' | 'ë' => folded.push('e'),
            'î' | 'ï' | 'í' => folded.push('i'),
            'ô' | 'ö' | 'ó' => folded.push('o'),
            'ù' | 'û' | 'ü' | 'ú' => folded.push('u'),
            'ç' => folded.push('c'),
            'ÿ' => folded.push('y'),
            'œ' => folded.push_str("oe"),
            other => folded.push(other),
        }
    }
    folded
}

macro_rules! text_enum {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $text:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[serde(rename = $text)]
                $variant,
            )*
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Text persisted for this variant.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let key = fold_status(raw);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|variant| fold_status(variant.as_str()) == key)
                    .ok_or_else(|| UnknownStatus::new(stringify!($name), raw))
            }
        }
    };
}

text_enum! {
    /// Lifecycle of a client demande.
    pub enum DemandeStatus {
        EnAttente => "En_attente",
        EnCours => "En_cours",
        Traitee => "Traitee",
        Rejetee => "Rejetee",
        Annule => "Annule",
        /// Soft-deleted; only reachable through deletion.
        Supprimee => "Supprimee",
    }
}

const DEMANDE_SYNONYMS: &[(&str, DemandeStatus)] = &[
    ("en_attente", DemandeStatus::EnAttente),
    ("attente", DemandeStatus::EnAttente),
    ("en_attente_de_traitement", DemandeStatus::EnAttente),
    ("a_traiter", DemandeStatus::EnAttente),
    ("nouveau", DemandeStatus::EnAttente),
    ("nouvelle", DemandeStatus::EnAttente),
    ("pending", DemandeStatus::EnAttente),
    ("en_cours", DemandeStatus::EnCours),
    ("encours", DemandeStatus::EnCours),
    ("en_cours_de_traitement", DemandeStatus::EnCours),
    ("en_traitement", DemandeStatus::EnCours),
    ("in_progress", DemandeStatus::EnCours),
    ("traitee", DemandeStatus::Traitee),
    ("traite", DemandeStatus::Traitee),
    ("terminee", DemandeStatus::Traitee),
    ("termine", DemandeStatus::Traitee),
    ("resolue", DemandeStatus::Traitee),
    ("resolu", DemandeStatus::Traitee),
    ("cloturee", DemandeStatus::Traitee),
    ("cloture", DemandeStatus::Traitee),
    ("done", DemandeStatus::Traitee),
    ("rejetee", DemandeStatus::Rejetee),
    ("rejete", DemandeStatus::Rejetee),
    ("refusee", DemandeStatus::Rejetee),
    ("refuse", DemandeStatus::Rejetee),
    ("rejected", DemandeStatus::Rejetee),
    ("annule", DemandeStatus::Annule),
    ("annulee", DemandeStatus::Annule),
    ("cancelled", DemandeStatus::Annule),
    ("canceled", DemandeStatus::Annule),
];

impl DemandeStatus {
    /// Map a human-entered status onto one of the five settable states.
    ///
    /// `Supprimee` is never produced; soft deletion has its own operation.
    ///
    /// # Examples
    /// ```
    /// use fieldops::domain::DemandeStatus;
    ///
    /// assert_eq!(DemandeStatus::normalize("rejetée"), Ok(DemandeStatus::Rejetee));
    /// assert!(DemandeStatus::normalize("supprimee").is_err());
    /// ```
    pub fn normalize(raw: &str) -> Result<Self, UnknownStatus> {
        let key = fold_status(raw);
        DEMANDE_SYNONYMS
            .iter()
            .find(|(synonym, _)| *synonym == key)
            .map(|(_, status)| *status)
            .ok_or_else(|| UnknownStatus::new("DemandeStatus", raw))
    }

    /// Whether a status change should persist the supplied comment as reason.
    pub fn records_reason(self) -> bool {
        matches!(self, Self::Rejetee | Self::Annule)
    }
}

text_enum! {
    /// Progress of a ticket.
    pub enum TicketEtat {
        PasCommence => "Pas_commence",
        EnCours => "En_cours",
        Termine => "Termine",
        Bloque => "Bloque",
    }
}

text_enum! {
    /// Scheduling state of an intervention.
    pub enum InterventionStatus {
        EnAttente => "En_attente",
        EnCours => "En_cours",
        Termine => "Termine",
        Annule => "Annule",
    }
}

text_enum! {
    /// Per-agent calendar projection state of an intervention.
    pub enum InterventionEventStatus {
        Planifie => "Planifie",
        EnCours => "En_cours",
        Termine => "Termine",
        Annule => "Annule",
    }
}

impl InterventionEventStatus {
    /// Project free intervention status text onto the event vocabulary.
    ///
    /// Anything not recognised as in progress, finished or cancelled is
    /// considered planned.
    pub fn from_intervention_text(raw: &str) -> Self {
        match fold_status(raw).as_str() {
            "en_cours" => Self::EnCours,
            "termine" | "terminee" => Self::Termine,
            "annule" | "annulee" => Self::Annule,
            _ => Self::Planifie,
        }
    }
}

impl From<InterventionStatus> for InterventionEventStatus {
    fn from(status: InterventionStatus) -> Self {
        Self::from_intervention_text(status.as_str())
    }
}

text_enum! {
    /// Progress of a work order or one of its tasks.
    pub enum TravauxEtat {
        AFaire => "A_faire",
        EnCours => "En_cours",
        Termine => "Termine",
        Bloque => "Bloque",
        Annule => "Annule",
    }
}

text_enum! {
    /// Urgency of a work order.
    pub enum TravauxPriorite {
        Basse => "Basse",
        Normale => "Normale",
        Haute => "Haute",
        Urgente => "Urgente",
    }
}

text_enum! {
    /// Role tag on a responsable association.
    pub enum ResponsableRole {
        Primaire => "Primaire",
        Secondaire => "Secondaire",
    }
}
