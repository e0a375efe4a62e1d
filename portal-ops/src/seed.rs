/// Demo data
///
/// One organization (`org-acme`) with four users covering the role ladder,
/// two projects and a populated `proj-spring-launch`: work items, calendar
/// events, assets, insights, a message thread, a pending approval and the
/// org's tool inventory.
///
/// Inputs go through the same validation rules the API applies before
/// documents are built.
///
/// Every document has a fixed id and is written with upsert, so seeding
/// twice leaves the same set of documents. Dates are relative to the day
/// the data is built.

use chrono::{Duration, NaiveDate, Utc};
use portal_shared::auth::authorization::{Role, RoleGrant};
use portal_shared::db::{SharedStore, StoreResult};
use portal_shared::models::{
    approval::{Approval, CreateApproval},
    asset::{Asset, AssetKind, AssetStatus, CreateAsset},
    event::{CreateEvent, Event, EventKind},
    insight::{CreateInsight, Insight},
    message::{CreateMessage, Message},
    organization::{Organization, Plan},
    project::{CreateProject, Project, ProjectStatus},
    tool::{CreateToolInventoryItem, ToolInventoryItem, ToolStatus},
    user::User,
    work_item::{CreateWorkItem, WorkItem, WorkItemStatus},
};
use validator::{Validate, ValidationErrors};

pub const DEMO_ORG_ID: &str = "org-acme";
pub const DEMO_PROJECT_ID: &str = "proj-spring-launch";
pub const DEMO_OWNER_ID: &str = "user-olivia";

const MANAGER_ID: &str = "user-dana";
const MEMBER_ID: &str = "user-max";
const CLIENT_ID: &str = "user-carla";
const THREAD_ID: &str = "msg-kickoff";

/// Every document the seed writes
#[derive(Debug, Clone)]
pub struct SeedData {
    pub organization: Organization,
    pub users: Vec<User>,
    pub projects: Vec<Project>,
    pub work_items: Vec<WorkItem>,
    pub events: Vec<Event>,
    pub assets: Vec<Asset>,
    pub insights: Vec<Insight>,
    pub messages: Vec<Message>,
    pub approvals: Vec<Approval>,
    pub tools: Vec<ToolInventoryItem>,
}

fn checked<T: Validate>(input: T) -> Result<T, ValidationErrors> {
    input.validate()?;
    Ok(input)
}

fn days_from_today(days: i64) -> NaiveDate {
    (Utc::now() + Duration::days(days)).date_naive()
}

fn user(id: &str, email: &str, name: &str, roles: Vec<RoleGrant>) -> User {
    let now = Utc::now();
    User {
        id: id.to_string(),
        org_id: DEMO_ORG_ID.to_string(),
        email: email.to_string(),
        name: name.to_string(),
        avatar_url: None,
        roles,
        created_at: now,
        updated_at: now,
    }
}

fn work_item(
    id: &str,
    title: &str,
    status: WorkItemStatus,
    priority: u8,
    assignee: &str,
    due_in: i64,
) -> Result<WorkItem, ValidationErrors> {
    let input = checked(CreateWorkItem {
        title: title.to_string(),
        description: None,
        status,
        priority,
        assignee_id: Some(assignee.to_string()),
        due_date: Some(days_from_today(due_in)),
    })?;
    Ok(WorkItem::build(DEMO_PROJECT_ID, id, input))
}

fn tool(
    id: &str,
    name: &str,
    category: &str,
    monthly_cost: f64,
    status: ToolStatus,
) -> Result<ToolInventoryItem, ValidationErrors> {
    let input = checked(CreateToolInventoryItem {
        name: name.to_string(),
        category: category.to_string(),
        monthly_cost,
        owner: Some(MANAGER_ID.to_string()),
        status,
    })?;
    Ok(ToolInventoryItem::build(DEMO_ORG_ID, id, input))
}

impl SeedData {
    /// Builds the demo data set
    ///
    /// Fails if any input breaks its model's validation rules.
    pub fn demo() -> Result<Self, ValidationErrors> {
        let now = Utc::now();

        let organization = Organization {
            id: DEMO_ORG_ID.to_string(),
            org_id: DEMO_ORG_ID.to_string(),
            name: "Acme Outdoor Co.".to_string(),
            slug: "acme".to_string(),
            plan: Plan::Growth,
            created_at: now,
            updated_at: now,
        };

        let users = vec![
            user(DEMO_OWNER_ID, "olivia@acme.test", "Olivia Hart", vec![RoleGrant::org(DEMO_ORG_ID, Role::Owner)]),
            user(MANAGER_ID, "dana@acme.test", "Dana Whitfield", vec![RoleGrant::org(DEMO_ORG_ID, Role::Manager)]),
            user(
                MEMBER_ID,
                "max@acme.test",
                "Max Ortega",
                vec![
                    RoleGrant::org(DEMO_ORG_ID, Role::Member),
                    RoleGrant::project(DEMO_PROJECT_ID, Role::Member),
                ],
            ),
            user(
                CLIENT_ID,
                "carla@client.test",
                "Carla Jensen",
                vec![RoleGrant::project(DEMO_PROJECT_ID, Role::Client)],
            ),
        ];

        let projects = vec![
            Project::build(
                DEMO_ORG_ID,
                DEMO_PROJECT_ID,
                checked(CreateProject {
                    name: "Spring Launch".to_string(),
                    client_name: "Acme Outdoor".to_string(),
                    description: Some("Multi-channel launch of the spring hiking line".to_string()),
                    status: ProjectStatus::Active,
                    budget: 48_000.0,
                    start_date: Some(days_from_today(-21)),
                    end_date: Some(days_from_today(60)),
                })?,
            ),
            Project::build(
                DEMO_ORG_ID,
                "proj-brand-refresh",
                checked(CreateProject {
                    name: "Brand Refresh".to_string(),
                    client_name: "Acme Outdoor".to_string(),
                    description: None,
                    status: ProjectStatus::Planning,
                    budget: 15_000.0,
                    start_date: Some(days_from_today(30)),
                    end_date: None,
                })?,
            ),
        ];

        let work_items = vec![
            work_item("wi-creative-brief", "Write creative brief", WorkItemStatus::Done, 2, MANAGER_ID, -14)?,
            work_item("wi-hero-banner", "Design hero banner", WorkItemStatus::Review, 1, MEMBER_ID, 3)?,
            work_item("wi-email-sequence", "Draft launch email sequence", WorkItemStatus::InProgress, 2, MEMBER_ID, 7)?,
            work_item("wi-paid-social", "Set up paid social campaigns", WorkItemStatus::Todo, 3, MEMBER_ID, 14)?,
        ];

        let events = vec![
            Event::build(
                DEMO_PROJECT_ID,
                "evt-weekly-sync",
                checked(CreateEvent {
                    title: "Weekly client sync".to_string(),
                    kind: EventKind::Meeting,
                    starts_at: now + Duration::days(2),
                    ends_at: Some(now + Duration::days(2) + Duration::minutes(45)),
                })?,
            ),
            Event::build(
                DEMO_PROJECT_ID,
                "evt-launch-day",
                checked(CreateEvent {
                    title: "Launch day".to_string(),
                    kind: EventKind::Launch,
                    starts_at: now + Duration::days(21),
                    ends_at: None,
                })?,
            ),
        ];

        let assets = vec![
            Asset::build(
                DEMO_PROJECT_ID,
                "asset-hero-banner",
                checked(CreateAsset {
                    name: "Hero banner v3".to_string(),
                    kind: AssetKind::Image,
                    url: "https://assets.acme.test/spring/hero-banner-v3.png".to_string(),
                    status: AssetStatus::InReview,
                })?,
            ),
            Asset::build(
                DEMO_PROJECT_ID,
                "asset-launch-copy",
                checked(CreateAsset {
                    name: "Launch landing page copy".to_string(),
                    kind: AssetKind::Copy,
                    url: "https://assets.acme.test/spring/landing-copy.docx".to_string(),
                    status: AssetStatus::Approved,
                })?,
            ),
        ];

        let period = now.format("%Y-%m").to_string();
        let insights = vec![
            Insight::build(
                DEMO_PROJECT_ID,
                "ins-ctr",
                checked(CreateInsight {
                    title: "Email click-through rate".to_string(),
                    metric: "ctr".to_string(),
                    value: 4.2,
                    delta: 0.6,
                    period: period.clone(),
                })?,
            ),
            Insight::build(
                DEMO_PROJECT_ID,
                "ins-sessions",
                checked(CreateInsight {
                    title: "Landing page sessions".to_string(),
                    metric: "sessions".to_string(),
                    value: 12_840.0,
                    delta: -3.1,
                    period,
                })?,
            ),
        ];

        let messages = vec![
            Message::build(
                DEMO_PROJECT_ID,
                THREAD_ID,
                MANAGER_ID,
                checked(CreateMessage {
                    body: "Kickoff notes are in the brief. Banner review is due Friday.".to_string(),
                    thread_id: None,
                })?,
            ),
            Message::build(
                DEMO_PROJECT_ID,
                "msg-kickoff-reply",
                CLIENT_ID,
                checked(CreateMessage {
                    body: "Thanks, we'll have feedback by Thursday.".to_string(),
                    thread_id: Some(THREAD_ID.to_string()),
                })?,
            ),
        ];

        let approvals = vec![Approval::build(
            DEMO_PROJECT_ID,
            "appr-hero-banner",
            MEMBER_ID,
            checked(CreateApproval {
                subject_type: "asset".to_string(),
                subject_id: "asset-hero-banner".to_string(),
                comment: Some("Final round, please approve or reject by Friday".to_string()),
            })?,
        )];

        let tools = vec![
            tool("tool-analytics", "Web Analytics", "analytics", 0.0, ToolStatus::Active)?,
            tool("tool-email", "Email Platform", "email", 299.0, ToolStatus::Active)?,
            tool("tool-social", "Social Scheduler", "social", 99.0, ToolStatus::Trial)?,
        ];

        Ok(SeedData {
            organization,
            users,
            projects,
            work_items,
            events,
            assets,
            insights,
            messages,
            approvals,
            tools,
        })
    }

    /// Documents per container
    pub fn counts(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("organizations", 1),
            ("users", self.users.len()),
            ("projects", self.projects.len()),
            ("workItems", self.work_items.len()),
            ("events", self.events.len()),
            ("assets", self.assets.len()),
            ("insights", self.insights.len()),
            ("messages", self.messages.len()),
            ("approvals", self.approvals.len()),
            ("toolInventory", self.tools.len()),
        ]
    }
}

/// Upserts every document in `data`
///
/// Containers must exist (run `init-db` first).
pub async fn seed(store: &SharedStore, data: &SeedData) -> StoreResult<Vec<(&'static str, usize)>> {
    Organization::upsert(store, &data.organization).await?;

    for user in &data.users {
        User::upsert(store, user).await?;
    }
    for project in &data.projects {
        Project::upsert(store, project).await?;
    }
    for item in &data.work_items {
        WorkItem::upsert(store, item).await?;
    }
    for event in &data.events {
        Event::upsert(store, event).await?;
    }
    for asset in &data.assets {
        Asset::upsert(store, asset).await?;
    }
    for insight in &data.insights {
        Insight::upsert(store, insight).await?;
    }
    for message in &data.messages {
        Message::upsert(store, message).await?;
    }
    for approval in &data.approvals {
        Approval::upsert(store, approval).await?;
    }
    for tool in &data.tools {
        ToolInventoryItem::upsert(store, tool).await?;
    }

    let counts = data.counts();
    tracing::info!(
        org_id = %data.organization.id,
        documents = counts.iter().map(|(_, n)| n).sum::<usize>(),
        "Seeded demo data"
    );

    Ok(counts)
}
