use chrono::Utc;
use compliancehub_core::{
    CompanyId, CreateInvitation, DepartmentId, DepartmentInput, DepartmentNode, InvitationId,
    ListQuery, MembershipId, Role,
};

use super::Context;
use crate::cli::{CompanyCommands, DepartmentCommands, TeamCommands};
use crate::output::{label, or_dash, print_done, print_one, print_out};

/// Cap on pages followed for full listings.
const MAX_PAGES: u32 = 20;

pub async fn company(ctx: &Context, command: CompanyCommands) -> anyhow::Result<()> {
    let orgs = ctx.client.organizations();
    match command {
        CompanyCommands::List => {
            let current = orgs.current().await?;
            let companies = orgs.list(&ListQuery::new()).await?.results;
            print_out(ctx.json, &companies, |c| {
                let marker = if current.as_ref() == Some(&c.id) { "*" } else { " " };
                format!("{} {}\t{}\t{}", marker, c.id, c.name, label(&c.plan))
            })
        }
        CompanyCommands::Create { name } => {
            let created = orgs.create_with_membership(&name).await?;
            orgs.select_company(&created.company.id).await?;
            print_one(ctx.json, &created, |c| {
                format!(
                    "Created {} ({}), you are its {}. It is now the selected company.",
                    c.company.name,
                    c.company.id,
                    c.membership.role.label()
                )
            })
        }
        CompanyCommands::Use { id } => {
            let id = CompanyId::new(id);
            orgs.select_company(&id).await?;
            print_done(ctx.json, &format!("Now acting for company {}", id))
        }
    }
}

pub async fn team(ctx: &Context, command: TeamCommands) -> anyhow::Result<()> {
    let team = ctx.client.team();
    match command {
        TeamCommands::Members => {
            let members = team.members().await?;
            print_out(ctx.json, &members, |m| {
                format!("{}\t{}\t{}\t{}", m.id, m.user_email, m.user_name, m.role.label())
            })
        }
        TeamCommands::Role { membership, role } => {
            let role: Role = role.parse()?;
            let updated = team.change_role(&MembershipId::new(membership), role).await?;
            print_one(ctx.json, &updated, |m| {
                format!("{} is now {}", m.user_email, m.role.label())
            })
        }
        TeamCommands::Remove { membership } => {
            team.remove(&MembershipId::new(membership)).await?;
            print_done(ctx.json, "Member removed")
        }
        TeamCommands::Invite { email, role } => {
            let request = CreateInvitation {
                email,
                role: role.parse()?,
            };
            let invitation = team.invite(&request).await?;
            print_one(ctx.json, &invitation, |i| {
                let who = if i.email.is_empty() { "anyone with the token" } else { i.email.as_str() };
                format!(
                    "Invitation for {} as {}\ntoken: {}\nexpires: {}",
                    who,
                    i.role.label(),
                    i.token,
                    or_dash(i.expires_at.map(|d| d.date_naive()))
                )
            })
        }
        TeamCommands::Invitations => {
            let now = Utc::now();
            let invitations = team.invitations(&ListQuery::new()).await?.results;
            print_out(ctx.json, &invitations, |i| {
                let state = if i.is_revoked {
                    "revoked"
                } else if i.accepted_at.is_some() {
                    "accepted"
                } else if i.is_pending(now) {
                    "pending"
                } else {
                    "expired"
                };
                let email = if i.email.is_empty() { "-" } else { i.email.as_str() };
                format!("{}\t{}\t{}\t{}", i.id, email, i.role.label(), state)
            })
        }
        TeamCommands::Revoke { invitation } => {
            let done = team.revoke(&InvitationId::new(invitation)).await?;
            print_done(ctx.json, &done.message)
        }
        TeamCommands::Accept { token } => {
            let accepted = team.accept(&token).await?;
            ctx.client
                .organizations()
                .select_company(&accepted.company.id)
                .await?;
            print_one(ctx.json, &accepted, |a| {
                format!(
                    "Joined {} as {}. It is now the selected company.",
                    a.company.name,
                    a.membership.role.label()
                )
            })
        }
    }
}

fn render_tree(nodes: &[DepartmentNode], depth: usize, out: &mut Vec<String>) {
    for node in nodes {
        let code = if node.code.is_empty() {
            String::new()
        } else {
            format!(" [{}]", node.code)
        };
        out.push(format!("{}{}{}", "  ".repeat(depth), node.name, code));
        render_tree(&node.children, depth + 1, out);
    }
}

pub async fn departments(ctx: &Context, command: DepartmentCommands) -> anyhow::Result<()> {
    let departments = ctx.client.departments();
    match command {
        DepartmentCommands::List => {
            let all = ctx
                .client
                .transport()
                .collect_pages::<compliancehub_core::Department>(
                    "organizations/departments/",
                    &ListQuery::new().ordering("name"),
                    MAX_PAGES,
                )
                .await?;
            print_out(ctx.json, &all, |d| {
                format!("{}\t{}\t{}", d.id, d.full_path, or_dash(d.parent_name.clone()))
            })
        }
        DepartmentCommands::Tree => {
            let tree = departments.tree().await?;
            print_one(ctx.json, &tree, |t| {
                let mut lines = Vec::new();
                render_tree(t, 0, &mut lines);
                if lines.is_empty() {
                    "(none)".to_string()
                } else {
                    lines.join("\n")
                }
            })
        }
        DepartmentCommands::Create {
            name,
            code,
            parent,
            description,
        } => {
            let input = DepartmentInput {
                name,
                description,
                code,
                parent: parent.map(DepartmentId::new),
                manager: None,
            };
            let created = departments.create(&input).await?;
            print_one(ctx.json, &created, |d| format!("Created {} ({})", d.full_path, d.id))
        }
        DepartmentCommands::Delete { id } => {
            departments.delete(&DepartmentId::new(id)).await?;
            print_done(ctx.json, "Department deleted")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_tree_indents_children() {
        let tree: Vec<DepartmentNode> = serde_json::from_value(serde_json::json!([{
            "id": "d-1", "name": "Engineering", "code": "ENG",
            "children": [{"id": "d-2", "name": "Platform", "children": []}]
        }]))
        .unwrap();
        let mut lines = Vec::new();
        render_tree(&tree, 0, &mut lines);
        assert_eq!(lines, vec!["Engineering [ENG]", "  Platform"]);
    }
}
