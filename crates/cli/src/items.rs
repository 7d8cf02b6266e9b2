//! Launcher item model and builders
//!
//! Everything here is pure: enriched containers in, script-filter items
//! out. The action payload attached to each item is what `act` parses
//! back, so the two halves of the binary share these types.

use catalog_lib::{format_subtitle, EnrichedContainer};
use serde::{Deserialize, Serialize};

const ICON_DEFAULT: &str = "icon.png";
const ICON_STOPPED: &str = "icon-stopped.png";

/// Top-level script-filter document: `{"items": [...]}`
#[derive(Debug, Serialize)]
pub struct ItemList {
    pub items: Vec<Item>,
}

/// One script-filter row
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<String>,
    pub valid: bool,
    pub icon: Icon,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mods: Option<Mods>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Icon {
    pub path: String,
}

/// Modifier-key overrides for a container row
#[derive(Debug, Clone, Serialize)]
pub struct Mods {
    pub cmd: ModAction,
    pub alt: ModAction,
    pub ctrl: ModAction,
    pub shift: ModAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModAction {
    pub subtitle: String,
    pub arg: String,
}

/// What the user asked for by selecting an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Default,
    OpenUrl,
    Start,
    Stop,
    Restart,
    Logs,
    Shell,
    CopyUrl,
    ProjectAction,
}

/// Batch verb carried by a project item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectAction {
    StartProject,
    StopProject,
}

/// The JSON document attached to every selectable item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPayload {
    pub action: ActionKind,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default)]
    pub url: String,
    /// Resolution target for `ActionKind::Default`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_action: Option<ActionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_action: Option<ProjectAction>,
}

impl ActionPayload {
    pub fn for_container(action: ActionKind, container: &EnrichedContainer) -> Self {
        Self {
            action,
            id: container.id.clone(),
            name: container.name.clone(),
            project: container.project.clone(),
            service: container.service.clone(),
            url: container.url.clone(),
            default_action: None,
            project_action: None,
        }
    }

    pub fn for_project(project: &str, action: ProjectAction) -> Self {
        Self {
            action: ActionKind::ProjectAction,
            id: project.to_string(),
            name: project.to_string(),
            project: Some(project.to_string()),
            service: None,
            url: String::new(),
            default_action: None,
            project_action: Some(action),
        }
    }

    /// Serialised form carried in the item's `arg`
    pub fn to_arg(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// The launcher passes its template placeholder through verbatim when no
/// query was typed; treat it like an empty query.
pub fn normalize_query(raw: Option<&str>) -> &str {
    match raw {
        None | Some("{query}") => "",
        Some(query) => query,
    }
}

/// Full item list for one invocation, covering the error and empty states
pub fn assemble(runtime_available: bool, containers: &[EnrichedContainer], query: &str) -> Vec<Item> {
    if !runtime_available {
        return vec![error_item(
            "Docker not found",
            "Please ensure Docker/OrbStack is installed and in PATH",
        )];
    }

    if containers.is_empty() {
        return vec![empty_item()];
    }

    let matched = filter_containers(containers, query);
    if matched.is_empty() {
        return vec![error_item(
            "No matching containers",
            &format!("No containers match \"{query}\""),
        )];
    }

    let mut items: Vec<Item> = matched.iter().map(|c| container_item(c)).collect();
    items.extend(project_batch_items(&matched));
    items
}

/// Case-insensitive substring match across the fields a user would type
pub fn filter_containers<'a>(
    containers: &'a [EnrichedContainer],
    query: &str,
) -> Vec<&'a EnrichedContainer> {
    if query.is_empty() {
        return containers.iter().collect();
    }

    let needle = query.to_lowercase();
    containers
        .iter()
        .filter(|container| {
            [
                container.display_name.as_str(),
                container.name.as_str(),
                container.project.as_deref().unwrap_or_default(),
                container.service.as_deref().unwrap_or_default(),
                container.image.as_str(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Selectable row for one container, with modifier actions attached
pub fn container_item(container: &EnrichedContainer) -> Item {
    let default_action = if container.is_web_service {
        ActionKind::OpenUrl
    } else {
        ActionKind::Shell
    };
    let mut default_payload = ActionPayload::for_container(ActionKind::Default, container);
    default_payload.default_action = Some(default_action);

    let title = if container.is_web_service {
        format!("🌐 {}", container.display_name)
    } else {
        container.display_name.clone()
    };

    let alt = if container.status.is_running() {
        ModAction {
            subtitle: "Stop container".to_string(),
            arg: ActionPayload::for_container(ActionKind::Stop, container).to_arg(),
        }
    } else {
        ModAction {
            subtitle: "Start container".to_string(),
            arg: ActionPayload::for_container(ActionKind::Start, container).to_arg(),
        }
    };

    Item {
        uid: container.id.clone(),
        title,
        subtitle: format_subtitle(container),
        arg: Some(default_payload.to_arg()),
        autocomplete: Some(container.display_name.clone()),
        valid: true,
        icon: Icon {
            path: icon_path(container).to_string(),
        },
        mods: Some(Mods {
            cmd: ModAction {
                subtitle: format!("Open {}", container.url),
                arg: ActionPayload::for_container(ActionKind::OpenUrl, container).to_arg(),
            },
            alt,
            ctrl: ModAction {
                subtitle: "Tail logs".to_string(),
                arg: ActionPayload::for_container(ActionKind::Logs, container).to_arg(),
            },
            shift: ModAction {
                subtitle: format!("Copy {}", container.url),
                arg: ActionPayload::for_container(ActionKind::CopyUrl, container).to_arg(),
            },
        }),
    }
}

/// Batch start/stop row for a compose project
pub fn project_item(project: &str, members: &[&EnrichedContainer]) -> Item {
    let running = members.iter().filter(|c| c.status.is_running()).count();
    let stopped = members.len() - running;

    let (action, lead) = if running > 0 {
        (
            ProjectAction::StopProject,
            format!("Stop {running} running containers"),
        )
    } else {
        (
            ProjectAction::StartProject,
            format!("Start {stopped} stopped containers"),
        )
    };

    Item {
        uid: format!("project_{project}"),
        title: format!("📦 {project}"),
        subtitle: format!("{lead} • {} total containers", members.len()),
        arg: Some(ActionPayload::for_project(project, action).to_arg()),
        autocomplete: Some(format!("project {project}")),
        valid: true,
        icon: Icon {
            path: ICON_DEFAULT.to_string(),
        },
        mods: None,
    }
}

/// Unselectable row explaining why there is nothing to pick
pub fn error_item(title: &str, subtitle: &str) -> Item {
    Item {
        uid: "error".to_string(),
        title: title.to_string(),
        subtitle: subtitle.to_string(),
        arg: None,
        autocomplete: None,
        valid: false,
        icon: Icon {
            path: ICON_DEFAULT.to_string(),
        },
        mods: None,
    }
}

fn empty_item() -> Item {
    Item {
        uid: "empty".to_string(),
        title: "No containers found".to_string(),
        subtitle: "No Docker containers are available. Try starting some containers in OrbStack."
            .to_string(),
        arg: None,
        autocomplete: None,
        valid: false,
        icon: Icon {
            path: ICON_DEFAULT.to_string(),
        },
        mods: None,
    }
}

/// One batch item per project with more than one matching container,
/// appended after the container rows in first-seen order.
fn project_batch_items(containers: &[&EnrichedContainer]) -> Vec<Item> {
    let mut groups: Vec<(&str, Vec<&EnrichedContainer>)> = Vec::new();
    for container in containers.iter().copied() {
        let Some(project) = container.project.as_deref() else {
            continue;
        };
        match groups.iter_mut().find(|(name, _)| *name == project) {
            Some((_, members)) => members.push(container),
            None => groups.push((project, vec![container])),
        }
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(project, members)| project_item(project, &members))
        .collect()
}

fn icon_path(container: &EnrichedContainer) -> &'static str {
    if container.status.is_running() {
        ICON_DEFAULT
    } else {
        ICON_STOPPED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_lib::{ContainerStatus, HealthState};

    fn enriched(id: &str, name: &str, running: bool, web: bool) -> EnrichedContainer {
        EnrichedContainer {
            id: id.to_string(),
            name: name.to_string(),
            display_name: name.to_string(),
            project: None,
            service: None,
            status: if running {
                ContainerStatus::Running
            } else {
                ContainerStatus::Stopped
            },
            health: HealthState::Unknown,
            image: "nginx:alpine".to_string(),
            ports: String::new(),
            url: format!("https://{name}.orb.local/"),
            is_web_service: web,
            stats: None,
        }
    }

    fn compose(id: &str, name: &str, project: &str, service: &str, running: bool) -> EnrichedContainer {
        let mut container = enriched(id, name, running, true);
        container.project = Some(project.to_string());
        container.service = Some(service.to_string());
        container.display_name = format!("{service} - {project}");
        container.url = format!("https://{service}.{project}.orb.local/");
        container
    }

    #[test]
    fn test_normalize_query_strips_placeholder() {
        assert_eq!(normalize_query(None), "");
        assert_eq!(normalize_query(Some("{query}")), "");
        assert_eq!(normalize_query(Some("web")), "web");
    }

    #[test]
    fn test_payload_round_trips_through_serde() {
        let container = compose("abc123def456", "shop-web-1", "shop", "web", true);
        let payload = ActionPayload::for_container(ActionKind::Start, &container);

        let parsed: ActionPayload = serde_json::from_str(&payload.to_arg()).unwrap();
        assert_eq!(parsed, payload);
        assert_eq!(parsed.action, ActionKind::Start);
        assert_eq!(parsed.project.as_deref(), Some("shop"));
    }

    #[test]
    fn test_web_container_item_defaults_to_open_url() {
        let container = compose("abc123def456", "shop-web-1", "shop", "web", true);
        let item = container_item(&container);

        assert_eq!(item.uid, "abc123def456");
        assert_eq!(item.title, "🌐 web - shop");
        assert_eq!(item.autocomplete.as_deref(), Some("web - shop"));
        assert!(item.valid);
        assert_eq!(item.icon.path, "icon.png");

        let payload: ActionPayload = serde_json::from_str(item.arg.as_deref().unwrap()).unwrap();
        assert_eq!(payload.action, ActionKind::Default);
        assert_eq!(payload.default_action, Some(ActionKind::OpenUrl));
    }

    #[test]
    fn test_stopped_tool_item_defaults_to_shell() {
        let container = enriched("def789", "worker", false, false);
        let item = container_item(&container);

        assert_eq!(item.title, "worker");
        assert_eq!(item.icon.path, "icon-stopped.png");

        let payload: ActionPayload = serde_json::from_str(item.arg.as_deref().unwrap()).unwrap();
        assert_eq!(payload.default_action, Some(ActionKind::Shell));
    }

    #[test]
    fn test_alt_modifier_toggles_between_stop_and_start() {
        let running = container_item(&enriched("aaa", "svc", true, false));
        let mods = running.mods.unwrap();
        assert_eq!(mods.alt.subtitle, "Stop container");
        let payload: ActionPayload = serde_json::from_str(&mods.alt.arg).unwrap();
        assert_eq!(payload.action, ActionKind::Stop);

        let stopped = container_item(&enriched("bbb", "svc", false, false));
        let mods = stopped.mods.unwrap();
        assert_eq!(mods.alt.subtitle, "Start container");
        let payload: ActionPayload = serde_json::from_str(&mods.alt.arg).unwrap();
        assert_eq!(payload.action, ActionKind::Start);
    }

    #[test]
    fn test_modifiers_cover_url_logs_and_clipboard() {
        let container = compose("abc", "shop-web-1", "shop", "web", true);
        let mods = container_item(&container).mods.unwrap();

        assert_eq!(mods.cmd.subtitle, "Open https://web.shop.orb.local/");
        let cmd: ActionPayload = serde_json::from_str(&mods.cmd.arg).unwrap();
        assert_eq!(cmd.action, ActionKind::OpenUrl);

        let ctrl: ActionPayload = serde_json::from_str(&mods.ctrl.arg).unwrap();
        assert_eq!(ctrl.action, ActionKind::Logs);

        let shift: ActionPayload = serde_json::from_str(&mods.shift.arg).unwrap();
        assert_eq!(shift.action, ActionKind::CopyUrl);
    }

    #[test]
    fn test_filter_matches_any_field_case_insensitively() {
        let containers = vec![
            compose("aaa", "shop-web-1", "shop", "web", true),
            enriched("bbb", "redis-standalone", true, false),
        ];

        assert_eq!(filter_containers(&containers, "SHOP").len(), 1);
        assert_eq!(filter_containers(&containers, "redis").len(), 1);
        assert_eq!(filter_containers(&containers, "NGINX").len(), 2);
        assert_eq!(filter_containers(&containers, "").len(), 2);
        assert!(filter_containers(&containers, "zzz").is_empty());
    }

    #[test]
    fn test_assemble_reports_missing_runtime() {
        let items = assemble(false, &[], "");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Docker not found");
        assert!(!items[0].valid);
    }

    #[test]
    fn test_assemble_reports_empty_catalog() {
        let items = assemble(true, &[], "");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "No containers found");
        assert!(!items[0].valid);
    }

    #[test]
    fn test_assemble_reports_unmatched_query() {
        let containers = vec![enriched("aaa", "svc", true, false)];
        let items = assemble(true, &containers, "nope");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "No matching containers");
        assert_eq!(items[0].subtitle, "No containers match \"nope\"");
    }

    #[test]
    fn test_assemble_appends_project_batch_item() {
        let containers = vec![
            compose("aaa", "shop-web-1", "shop", "web", true),
            compose("bbb", "shop-db-1", "shop", "db", false),
        ];

        let items = assemble(true, &containers, "");
        assert_eq!(items.len(), 3);

        let batch = &items[2];
        assert_eq!(batch.uid, "project_shop");
        assert_eq!(batch.title, "📦 shop");
        assert_eq!(batch.subtitle, "Stop 1 running containers • 2 total containers");
        assert_eq!(batch.autocomplete.as_deref(), Some("project shop"));

        let payload: ActionPayload = serde_json::from_str(batch.arg.as_deref().unwrap()).unwrap();
        assert_eq!(payload.action, ActionKind::ProjectAction);
        assert_eq!(payload.project_action, Some(ProjectAction::StopProject));
        assert_eq!(payload.project.as_deref(), Some("shop"));
    }

    #[test]
    fn test_project_item_offers_start_when_nothing_runs() {
        let a = compose("aaa", "shop-web-1", "shop", "web", false);
        let b = compose("bbb", "shop-db-1", "shop", "db", false);
        let item = project_item("shop", &[&a, &b]);

        assert_eq!(item.subtitle, "Start 2 stopped containers • 2 total containers");
        let payload: ActionPayload = serde_json::from_str(item.arg.as_deref().unwrap()).unwrap();
        assert_eq!(payload.project_action, Some(ProjectAction::StartProject));
    }

    #[test]
    fn test_single_member_projects_get_no_batch_item() {
        let containers = vec![
            compose("aaa", "shop-web-1", "shop", "web", true),
            enriched("bbb", "loner", true, false),
        ];

        let items = assemble(true, &containers, "");
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| !item.uid.starts_with("project_")));
    }

    #[test]
    fn test_error_items_serialize_without_arg_or_mods() {
        let value = serde_json::to_value(error_item("oops", "details")).unwrap();
        let object = value.as_object().unwrap();

        assert!(!object.contains_key("arg"));
        assert!(!object.contains_key("autocomplete"));
        assert!(!object.contains_key("mods"));
        assert_eq!(object["valid"], serde_json::Value::Bool(false));
    }
}
