//! Catalog of commonly useful sources, used to seed an empty registry.

use crate::domain::Domain;
use crate::mapping::SlotRole;
use crate::schema::ModelSchema;
use crate::source::SourceConfig;

/// A source worth creating when its model is installed.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub name: &'static str,
    pub model: &'static str,
    pub title: &'static str,
    /// Tried in order; the first usable field wins
    pub start: &'static [&'static str],
    pub stop: &'static [&'static str],
    pub owner_single: Option<&'static str>,
    pub owner_many: Option<&'static str>,
    pub domain: &'static str,
}

pub const CATALOG: &[Candidate] = &[
    Candidate {
        name: "CRM Opportunities",
        model: "crm.lead",
        title: "name",
        start: &["date_deadline"],
        stop: &[],
        owner_single: Some("user_id"),
        owner_many: None,
        domain: "",
    },
    Candidate {
        name: "Project Tasks",
        model: "project.task",
        title: "name",
        start: &["date_deadline"],
        stop: &[],
        owner_single: Some("user_id"),
        owner_many: Some("user_ids"),
        domain: "",
    },
    Candidate {
        name: "Recruitment Applicants",
        model: "hr.applicant",
        title: "name",
        start: &["activity_date_deadline", "date_open", "create_date"],
        stop: &[],
        owner_single: Some("user_id"),
        owner_many: None,
        domain: "",
    },
    Candidate {
        name: "Maintenance Requests",
        model: "maintenance.request",
        title: "name",
        start: &["schedule_date"],
        stop: &[],
        owner_single: Some("user_id"),
        owner_many: None,
        domain: "",
    },
    Candidate {
        name: "Employees (birthdays/expiry)",
        model: "hr.employee",
        title: "name",
        start: &[
            "birthday",
            "visa_expire",
            "id_expiration_date",
            "permit_expiration",
            "expiration_date",
        ],
        stop: &[],
        owner_single: Some("user_id"),
        owner_many: None,
        domain: "",
    },
    Candidate {
        name: "Sales Orders",
        model: "sale.order",
        title: "name",
        start: &["validity_date", "commitment_date", "date_order"],
        stop: &[],
        owner_single: Some("user_id"),
        owner_many: None,
        domain: "",
    },
    Candidate {
        name: "Purchase Orders",
        model: "purchase.order",
        title: "name",
        start: &["date_order", "date_approve"],
        stop: &[],
        owner_single: Some("user_id"),
        owner_many: None,
        domain: "",
    },
    Candidate {
        name: "Meetings (owner)",
        model: "calendar.event",
        title: "name",
        start: &["start"],
        stop: &["stop"],
        owner_single: Some("user_id"),
        owner_many: None,
        domain: "",
    },
    Candidate {
        name: "To-Do (Activities)",
        model: "project.task",
        title: "name",
        start: &["date_deadline", "create_date"],
        stop: &[],
        owner_single: Some("user_id"),
        owner_many: None,
        domain: "[('project_id', '=', False)]",
    },
];

impl Candidate {
    /// Build a source for `schema`, or `None` if no start candidate is usable
    /// or the domain does not fit the model. Optional fields that are missing
    /// or mistyped are left unset.
    pub fn configure(&self, schema: &ModelSchema, owner_model: &str) -> Option<SourceConfig> {
        Domain::compile(self.domain, schema).ok()?;

        let usable = |role: SlotRole, name: &str| {
            schema
                .field(name)
                .filter(|field| role.accepts(field, owner_model))
                .map(|field| field.name.clone())
        };
        let first_usable = |role: SlotRole, names: &[&str]| {
            names.iter().find_map(|name| usable(role, *name))
        };

        let start = first_usable(SlotRole::Start, self.start)?;

        let mut source = SourceConfig::new(0, self.name, self.model, &start);
        source.title_field = usable(SlotRole::Title, self.title);
        source.stop_field = first_usable(SlotRole::Stop, self.stop);
        source.owner_single_field = self
            .owner_single
            .and_then(|name| usable(SlotRole::OwnerSingle, name));
        source.owner_many_field = self
            .owner_many
            .and_then(|name| usable(SlotRole::OwnerMany, name));
        source.domain = self.domain.to_string();

        Some(source)
    }
}
