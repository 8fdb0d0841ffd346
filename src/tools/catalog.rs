//! The closed tool catalog and the per-role registry built from it.

use super::spec::{FieldSpec, ToolSpec, ToolTemplate};
use crate::error::{RelevoError, Result};
use crate::role::{Deployment, Role};
use std::collections::HashMap;
use tracing::debug;
use url::Url;

const CERTIFICADOS: &[&str] = &["alumno_regular", "examen", "analitico"];
const ACCIONES_MATERIAL: &[&str] = &["subir", "ocultar", "visibilizar", "eliminar"];
const SI_NO: &[&str] = &["SI", "NO"];

/// Every tool known to the process, grouped by role in routing order.
pub static CATALOG: &[ToolTemplate] = &[
    ToolTemplate {
        name: "consultar_faltas",
        role: Role::Student,
        description: "Look up a student's recorded absences for one or more subjects.",
        fields: &[
            FieldSpec::text("dni", "Student national ID number, digits only"),
            FieldSpec::text_list("materias", "Subject names to check"),
        ],
    },
    ToolTemplate {
        name: "solicitar_certificado",
        role: Role::Student,
        description: "Request an official certificate for a student.",
        fields: &[
            FieldSpec::text("dni", "Student national ID number, digits only"),
            FieldSpec::one_of("tipo", CERTIFICADOS, "Kind of certificate"),
        ],
    },
    ToolTemplate {
        name: "gestionar_material",
        role: Role::Professor,
        description: "Upload, hide, show or delete a file in a subject's course material.",
        fields: &[
            FieldSpec::text("materia", "Subject name"),
            FieldSpec::text("archivo", "File name or link"),
            FieldSpec::one_of("accion", ACCIONES_MATERIAL, "Action to apply to the file"),
        ],
    },
    ToolTemplate {
        name: "enviar_aviso_materia",
        role: Role::Professor,
        description: "Send a notice to every student enrolled in a subject.",
        fields: &[
            FieldSpec::text("materia", "Subject name"),
            FieldSpec::text("asunto", "Notice subject line"),
            FieldSpec::text("mensaje", "Notice body"),
        ],
    },
    ToolTemplate {
        name: "crear_post_linkedin",
        role: Role::Administrative,
        description: "Publish a post on the institution's LinkedIn page.",
        fields: &[
            FieldSpec::text("titulo", "Post title"),
            FieldSpec::text("contenido", "Post body"),
        ],
    },
    ToolTemplate {
        name: "enviar_recordatorio_horas_siu",
        role: Role::Administrative,
        description: "Remind all staff to load their worked hours into SIU. Takes no arguments.",
        fields: &[],
    },
    ToolTemplate {
        name: "add_employee_learning_status",
        role: Role::Employee,
        description: "Record whether an employee completed training.",
        fields: &[
            FieldSpec::text("nombre", "Employee first name"),
            FieldSpec::text("apellido", "Employee last name"),
            FieldSpec::text("sector", "Employee department or sector"),
            FieldSpec::one_of("capacitacion", SI_NO, "Training completed, SI or NO"),
        ],
    },
    ToolTemplate {
        name: "create_one_mail_draft",
        role: Role::MailHandler,
        description: "Create ONE mail draft. Use this tool only once per request.",
        fields: &[
            FieldSpec::text("mail", "Recipient email address"),
            FieldSpec::text("asunto", "Email subject"),
            FieldSpec::text("contenido", "Email body"),
        ],
    },
];

/// Find a catalog entry by tool name.
pub fn template(name: &str) -> Option<&'static ToolTemplate> {
    CATALOG.iter().find(|t| t.name == name)
}

/// Immutable role → ordered tools mapping for one deployment.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    deployment: Deployment,
    by_role: HashMap<Role, Vec<ToolSpec>>,
}

impl ToolRegistry {
    /// Bind every tool of the deployment to its configured endpoint.
    ///
    /// Fails if any tool lacks an endpoint or the endpoint is not an
    /// absolute http(s) URL.
    pub fn build(deployment: Deployment, endpoints: &HashMap<String, String>) -> Result<Self> {
        let mut by_role: HashMap<Role, Vec<ToolSpec>> = HashMap::new();

        for template in CATALOG.iter().filter(|t| deployment.supports(t.role)) {
            let raw = endpoints.get(template.name).ok_or_else(|| {
                RelevoError::Config(format!(
                    "No webhook endpoint configured for '{}' (set webhooks.endpoints.{})",
                    template.name, template.name
                ))
            })?;
            let endpoint = parse_endpoint(template.name, raw)?;

            debug!("Registering tool {} -> {}", template.name, endpoint);
            by_role
                .entry(template.role)
                .or_default()
                .push(ToolSpec::bind(template, endpoint));
        }

        Ok(Self {
            deployment,
            by_role,
        })
    }

    pub fn deployment(&self) -> Deployment {
        self.deployment
    }

    /// Tools reachable by a role, in catalog order.
    pub fn tools_for(&self, role: Role) -> &[ToolSpec] {
        self.by_role.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Look up a tool of this deployment by name.
    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.by_role.values().flatten().find(|spec| spec.name == name)
    }

    /// All tools of the deployment, grouped by role.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &ToolSpec)> {
        self.deployment
            .roles()
            .iter()
            .flat_map(move |role| self.tools_for(*role).iter().map(move |spec| (*role, spec)))
    }

    /// Names that must never reach an end user: agents and tools.
    pub fn internal_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .deployment
            .roles()
            .iter()
            .map(|r| r.agent_name())
            .collect();
        names.extend(self.iter().map(|(_, spec)| spec.name));
        names
    }
}

/// Parse and check a webhook endpoint URL.
pub fn parse_endpoint(tool: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| {
        RelevoError::Config(format!("Invalid endpoint for '{}': {} ({})", tool, raw, e))
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(RelevoError::Config(format!(
            "Endpoint for '{}' must use http or https, got '{}'",
            tool, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints_for(deployment: Deployment) -> HashMap<String, String> {
        CATALOG
            .iter()
            .filter(|t| deployment.supports(t.role))
            .map(|t| (t.name.to_string(), format!("https://hooks.example.com/{}", t.name)))
            .collect()
    }

    #[test]
    fn test_catalog_names_unique() {
        let mut names: Vec<_> = CATALOG.iter().map(|t| t.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), CATALOG.len());
    }

    #[test]
    fn test_wire_enumerations() {
        let capacitacion = template("add_employee_learning_status").unwrap().fields[3];
        assert_eq!(capacitacion.name, "capacitacion");
        assert_eq!(capacitacion.kind, crate::tools::FieldKind::OneOf(&["SI", "NO"]));

        let accion = template("gestionar_material").unwrap().fields[2];
        assert_eq!(
            accion.kind,
            crate::tools::FieldKind::OneOf(&["subir", "ocultar", "visibilizar", "eliminar"])
        );

        assert!(template("enviar_recordatorio_horas_siu").unwrap().fields.is_empty());
    }

    #[test]
    fn test_registry_groups_by_role() {
        let registry =
            ToolRegistry::build(Deployment::University, &endpoints_for(Deployment::University))
                .unwrap();

        let student: Vec<_> = registry.tools_for(Role::Student).iter().map(|t| t.name).collect();
        assert_eq!(student, vec!["consultar_faltas", "solicitar_certificado"]);
        assert!(registry.tools_for(Role::Employee).is_empty());
        assert!(registry.get("crear_post_linkedin").is_some());
        assert!(registry.get("create_one_mail_draft").is_none());
        assert_eq!(registry.iter().count(), 6);
    }

    #[test]
    fn test_registry_requires_every_endpoint() {
        let mut endpoints = endpoints_for(Deployment::Workplace);
        endpoints.remove("create_one_mail_draft");
        let err = ToolRegistry::build(Deployment::Workplace, &endpoints).unwrap_err();
        assert!(err.to_string().contains("create_one_mail_draft"));
    }

    #[test]
    fn test_parse_endpoint_rejects_non_http() {
        assert!(parse_endpoint("x", "ftp://example.com/hook").is_err());
        assert!(parse_endpoint("x", "not a url").is_err());
        assert!(parse_endpoint("x", "https://hook.us1.make.com/abc").is_ok());
    }

    #[test]
    fn test_internal_names() {
        let registry =
            ToolRegistry::build(Deployment::Workplace, &endpoints_for(Deployment::Workplace))
                .unwrap();
        let names = registry.internal_names();
        assert!(names.contains(&"employee_agent"));
        assert!(names.contains(&"mail_agent"));
        assert!(names.contains(&"add_employee_learning_status"));
    }
}
