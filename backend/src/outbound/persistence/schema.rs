//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. Status columns are
//! plain `Varchar`; adapters parse them into the domain vocabularies.

diesel::table! {
    /// Login accounts. E-mail uniqueness is case-insensitive (index on
    /// `lower(email)`).
    users (id) {
        id -> Int4,
        email -> Varchar,
        /// Argon2 PHC string.
        password_hash -> Text,
        roles -> Array<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    client (id) {
        id -> Int4,
        nom_societe -> Varchar,
        representant_nom -> Nullable<Varchar>,
        representant_email -> Nullable<Varchar>,
        representant_tel -> Nullable<Varchar>,
        adresse_id -> Nullable<Int4>,
        commentaire -> Nullable<Text>,
        /// Owning account; at most one client per user.
        user_id -> Nullable<Int4>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Additional accounts allowed to act for a client.
    client_representant (client_id, user_id) {
        client_id -> Int4,
        user_id -> Int4,
    }
}

diesel::table! {
    site (id) {
        id -> Int4,
        client_id -> Int4,
        nom -> Varchar,
        commentaire -> Nullable<Text>,
    }
}

diesel::table! {
    affaire (id) {
        id -> Int4,
        nom -> Varchar,
    }
}

diesel::table! {
    doe (id) {
        id -> Int4,
        titre -> Varchar,
        site_id -> Nullable<Int4>,
        affaire_id -> Nullable<Int4>,
    }
}

diesel::table! {
    agent (matricule) {
        matricule -> Varchar,
        nom -> Varchar,
        prenom -> Nullable<Varchar>,
        email -> Nullable<Varchar>,
        user_id -> Nullable<Int4>,
        admin -> Bool,
    }
}

diesel::table! {
    agent_fonction (matricule, fonction) {
        matricule -> Varchar,
        fonction -> Varchar,
    }
}

diesel::table! {
    /// Client demandes. `status = 'Supprimee'` marks a soft delete.
    demande_client (id) {
        id -> Int4,
        client_id -> Int4,
        site_id -> Nullable<Int4>,
        titre -> Varchar,
        description -> Text,
        status -> Varchar,
        commentaire -> Nullable<Text>,
        /// Set once, by conversion.
        ticket_id -> Nullable<Int4>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    ticket (id) {
        id -> Int4,
        titre -> Varchar,
        description -> Nullable<Text>,
        etat -> Varchar,
        doe_id -> Nullable<Int4>,
        affaire_id -> Nullable<Int4>,
        site_id -> Nullable<Int4>,
        demande_id -> Nullable<Int4>,
        /// Matricule of the primary agent.
        responsable -> Nullable<Varchar>,
        date_debut -> Nullable<Timestamptz>,
        date_fin -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    ticket_responsable (id) {
        id -> Int4,
        ticket_id -> Int4,
        matricule -> Varchar,
        role -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    ticket_agent (id) {
        id -> Int4,
        ticket_id -> Int4,
        matricule -> Varchar,
        date_debut -> Nullable<Timestamptz>,
        date_fin -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Append-only.
    ticket_responsable_history (id) {
        id -> Int4,
        ticket_id -> Int4,
        old_matricule -> Nullable<Varchar>,
        new_matricule -> Nullable<Varchar>,
        changed_by -> Nullable<Varchar>,
        changed_at -> Timestamptz,
    }
}

diesel::table! {
    ticket_satisfaction (id) {
        id -> Int4,
        ticket_id -> Int4,
        rating -> Int2,
        commentaire -> Nullable<Text>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    image (id) {
        id -> Int4,
        nom -> Varchar,
        type_mime -> Varchar,
        taille -> Int4,
        data -> Bytea,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    ticket_image (ticket_id, image_id) {
        ticket_id -> Int4,
        image_id -> Int4,
    }
}

diesel::table! {
    intervention (id) {
        id -> Int4,
        ticket_id -> Int4,
        site_id -> Nullable<Int4>,
        demande_id -> Nullable<Int4>,
        titre -> Varchar,
        description -> Nullable<Text>,
        status -> Varchar,
        date_debut -> Nullable<Timestamptz>,
        date_fin -> Nullable<Timestamptz>,
        metier -> Nullable<Varchar>,
        ticket_agent_id -> Nullable<Int4>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per (intervention, agent); rewritten on every sync.
    intervention_event (id) {
        id -> Int4,
        intervention_id -> Int4,
        agent_matricule -> Varchar,
        titre -> Varchar,
        status -> Varchar,
        date_debut -> Nullable<Timestamptz>,
        date_fin -> Nullable<Timestamptz>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    materiel (id) {
        id -> Int4,
        nom -> Varchar,
        reference -> Nullable<Varchar>,
    }
}

diesel::table! {
    intervention_materiel (id) {
        id -> Int4,
        intervention_id -> Int4,
        materiel_id -> Int4,
        quantite -> Int4,
    }
}

diesel::table! {
    demande_materiel (id) {
        id -> Int4,
        ticket_id -> Nullable<Int4>,
        intervention_id -> Nullable<Int4>,
        commentaire -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Lines of a `demande_materiel`.
    gestion_demande_materiel (id) {
        id -> Int4,
        demande_materiel_id -> Int4,
        materiel_id -> Int4,
        quantite -> Int4,
    }
}

diesel::table! {
    rendu_intervention (id) {
        id -> Int4,
        intervention_id -> Int4,
        titre -> Varchar,
        description -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    rendu_intervention_image (rendu_id, image_id) {
        rendu_id -> Int4,
        image_id -> Int4,
    }
}

diesel::table! {
    travaux (id) {
        id -> Int4,
        titre -> Varchar,
        description -> Nullable<Text>,
        etat -> Varchar,
        priorite -> Varchar,
        date_debut -> Nullable<Timestamptz>,
        date_fin -> Nullable<Timestamptz>,
        date_echeance -> Nullable<Timestamptz>,
        doe_id -> Nullable<Int4>,
        affaire_id -> Nullable<Int4>,
        site_id -> Nullable<Int4>,
        demande_id -> Nullable<Int4>,
        ticket_id -> Nullable<Int4>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    demande_travaux (demande_id, travaux_id) {
        demande_id -> Int4,
        travaux_id -> Int4,
    }
}

diesel::table! {
    travaux_tache (id) {
        id -> Int4,
        travaux_id -> Int4,
        titre -> Varchar,
        description -> Nullable<Text>,
        etat -> Varchar,
        date_echeance -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    travaux_materiel (id) {
        id -> Int4,
        travaux_id -> Int4,
        materiel_id -> Int4,
        quantite -> Int4,
        commentaire -> Nullable<Text>,
    }
}

diesel::table! {
    travaux_agent (id) {
        id -> Int4,
        travaux_id -> Int4,
        matricule -> Varchar,
        date_debut -> Nullable<Timestamptz>,
        date_fin -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    travaux_responsable (id) {
        id -> Int4,
        travaux_id -> Int4,
        matricule -> Varchar,
        role -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    travaux_satisfaction (id) {
        id -> Int4,
        travaux_id -> Int4,
        rating -> Int2,
        commentaire -> Nullable<Text>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    rendu_travaux (id) {
        id -> Int4,
        travaux_id -> Int4,
        titre -> Varchar,
        description -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    rendu_travaux_image (rendu_id, image_id) {
        rendu_id -> Int4,
        image_id -> Int4,
    }
}

diesel::table! {
    /// Register of stored files, keyed to the record that produced them.
    document_repertoire (id) {
        id -> Int4,
        nom_fichier -> Varchar,
        type_mime -> Varchar,
        taille -> Int4,
        image_id -> Nullable<Int4>,
        ticket_id -> Nullable<Int4>,
        rendu_intervention_id -> Nullable<Int4>,
        rendu_travaux_id -> Nullable<Int4>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    message (id) {
        id -> Int4,
        conversation_id -> Varchar,
        sender_id -> Int4,
        receiver_id -> Int4,
        contenu -> Nullable<Text>,
        ticket_id -> Nullable<Int4>,
        demande_id -> Nullable<Int4>,
        client_id -> Nullable<Int4>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    message_attachment (id) {
        id -> Int4,
        message_id -> Int4,
        file_name -> Varchar,
        mime_type -> Varchar,
        size -> Int4,
        data -> Bytea,
    }
}

diesel::table! {
    /// Append-only audit trail.
    audit_log (id) {
        id -> Int4,
        entity_type -> Varchar,
        entity_id -> Varchar,
        action -> Varchar,
        actor_email -> Nullable<Varchar>,
        details -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(intervention_materiel -> materiel (materiel_id));
diesel::joinable!(gestion_demande_materiel -> materiel (materiel_id));
diesel::joinable!(gestion_demande_materiel -> demande_materiel (demande_materiel_id));
diesel::joinable!(message_attachment -> message (message_id));
diesel::joinable!(ticket_image -> image (image_id));
diesel::joinable!(rendu_intervention_image -> image (image_id));
diesel::joinable!(rendu_travaux_image -> image (image_id));
diesel::joinable!(demande_travaux -> demande_client (demande_id));
diesel::joinable!(agent_fonction -> agent (matricule));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    client,
    client_representant,
    site,
    affaire,
    doe,
    agent,
    agent_fonction,
    demande_client,
    ticket,
    ticket_responsable,
    ticket_agent,
    ticket_responsable_history,
    ticket_satisfaction,
    image,
    ticket_image,
    intervention,
    intervention_event,
    materiel,
    intervention_materiel,
    demande_materiel,
    gestion_demande_materiel,
    rendu_intervention,
    rendu_intervention_image,
    travaux,
    demande_travaux,
    travaux_tache,
    travaux_materiel,
    travaux_agent,
    travaux_responsable,
    travaux_satisfaction,
    rendu_travaux,
    rendu_travaux_image,
    document_repertoire,
    message,
    message_attachment,
    audit_log,
);
