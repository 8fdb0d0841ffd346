//! Personas, deployments and role inference.

use crate::error::RelevoError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// The persona a conversation is served under.
///
/// Each role maps to exactly one agent. A conversation without a role is
/// represented as `Option<Role>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Student,
    Professor,
    Administrative,
    Employee,
    MailHandler,
}

impl Role {
    /// Every role, in routing-table order.
    pub fn all() -> &'static [Role] {
        &[
            Role::Student,
            Role::Professor,
            Role::Administrative,
            Role::Employee,
            Role::MailHandler,
        ]
    }

    /// Internal name of the agent serving this role.
    pub fn agent_name(&self) -> &'static str {
        match self {
            Role::Student => "student_agent",
            Role::Professor => "professor_agent",
            Role::Administrative => "administrative_agent",
            Role::Employee => "employee_agent",
            Role::MailHandler => "mail_agent",
        }
    }

    /// How the role is named to end users.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Student => "alumno",
            Role::Professor => "profesor",
            Role::Administrative => "administrativo",
            Role::Employee => "empleado",
            Role::MailHandler => "correo",
        }
    }

    /// Patterns that name this role inside free text.
    fn keywords(&self) -> &'static str {
        match self {
            Role::Student => r"alumn[oa]s?|estudiantes?|students?",
            Role::Professor => r"profesor(?:a|es)?|docentes?|professors?|teachers?",
            Role::Administrative => r"administrativ[oa]s?|administraci[oó]n|staff",
            Role::Employee => r"emplead[oa]s?|employees?|capacitaci[oó]n",
            Role::MailHandler => r"mails?|correos?|e-?mails?|borrador(?:es)?",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Role {
    type Err = RelevoError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" | "alumno" | "alumna" | "estudiante" => Ok(Role::Student),
            "professor" | "profesor" | "profesora" | "docente" => Ok(Role::Professor),
            "administrative" | "administrativo" | "administrativa" | "admin" => {
                Ok(Role::Administrative)
            }
            "employee" | "empleado" | "empleada" => Ok(Role::Employee),
            "mail" | "mail-handler" | "mail_handler" | "correo" => Ok(Role::MailHandler),
            _ => Err(RelevoError::UnknownRole(s.to_string())),
        }
    }
}

/// Which routing table a process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deployment {
    /// Student, professor and administrative agents.
    #[default]
    University,
    /// Employee records and mail drafts.
    Workplace,
}

impl Deployment {
    /// Roles reachable in this deployment.
    pub fn roles(&self) -> &'static [Role] {
        match self {
            Deployment::University => &[Role::Student, Role::Professor, Role::Administrative],
            Deployment::Workplace => &[Role::Employee, Role::MailHandler],
        }
    }

    pub fn supports(&self, role: Role) -> bool {
        self.roles().contains(&role)
    }

    /// Infer the persona from a user message.
    ///
    /// Only the user speaking about themselves counts: a self-declaration
    /// ("soy profesor") or a message that is nothing but a role name, the
    /// usual answer to the role question. A role merely mentioned ("para mis
    /// alumnos") is unresolved.
    pub fn infer_role(&self, text: &str) -> Option<Role> {
        let text = text.to_lowercase();

        let declared: Vec<Role> = self
            .roles()
            .iter()
            .copied()
            .filter(|role| self_declaration(*role).is_match(&text))
            .collect();
        if let [role] = declared.as_slice() {
            return Some(*role);
        }

        self.roles()
            .iter()
            .copied()
            .find(|role| bare_answer(*role).is_match(text.trim()))
    }

    /// Comma-separated role names, for prompts.
    pub fn role_list(&self) -> String {
        self.roles()
            .iter()
            .map(|r| r.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Deployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Deployment::University => write!(f, "university"),
            Deployment::Workplace => write!(f, "workplace"),
        }
    }
}

impl std::str::FromStr for Deployment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "university" | "universidad" => Ok(Deployment::University),
            "workplace" | "empresa" => Ok(Deployment::Workplace),
            _ => Err(format!("Unknown deployment: {}", s)),
        }
    }
}

#[derive(Clone, Copy)]
enum PatternKind {
    /// "soy profesor", "I'm a student".
    SelfDeclared,
    /// The whole message is a role name, e.g. "alumno." or "una profesora".
    BareAnswer,
}

/// Compiled regexes, indexed in `Role::all()` order.
fn patterns(kind: PatternKind) -> &'static [Regex] {
    static DECLARED: OnceLock<Vec<Regex>> = OnceLock::new();
    static BARE: OnceLock<Vec<Regex>> = OnceLock::new();

    let cell = match kind {
        PatternKind::SelfDeclared => &DECLARED,
        PatternKind::BareAnswer => &BARE,
    };
    cell.get_or_init(|| {
        Role::all()
            .iter()
            .map(|role| {
                let pattern = match kind {
                    PatternKind::SelfDeclared => format!(
                        r"\b(?:soy|i am|i'm)\s+(?:un[ao]?\s+|an?\s+)?(?:{})\b",
                        role.keywords()
                    ),
                    PatternKind::BareAnswer => format!(
                        r"^\W*(?:(?:el|la|un[ao]?|an?)\s+)?(?:{})\W*$",
                        role.keywords()
                    ),
                };
                Regex::new(&pattern).expect("role patterns are static and valid")
            })
            .collect()
    })
}

fn role_index(role: Role) -> usize {
    Role::all().iter().position(|r| *r == role).unwrap_or(0)
}

fn self_declaration(role: Role) -> &'static Regex {
    &patterns(PatternKind::SelfDeclared)[role_index(role)]
}

fn bare_answer(role: Role) -> &'static Regex {
    &patterns(PatternKind::BareAnswer)[role_index(role)]
}
