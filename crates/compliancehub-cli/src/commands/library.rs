use compliancehub_core::{AdoptFramework, FrameworkId, ListQuery, RequirementNode};

use super::Context;
use crate::cli::FrameworkCommands;
use crate::output::{fields, label, or_dash, print_one, print_out};

fn render_requirements(nodes: &[RequirementNode], depth: usize, out: &mut Vec<String>) {
    for node in nodes {
        out.push(format!("{}{}  {}", "  ".repeat(depth), node.code, node.title));
        render_requirements(&node.children, depth + 1, out);
    }
}

pub async fn frameworks(ctx: &Context, command: FrameworkCommands) -> anyhow::Result<()> {
    let library = ctx.client.library();
    match command {
        FrameworkCommands::List { search } => {
            let query = match search {
                Some(term) => ListQuery::new().search(term),
                None => ListQuery::new(),
            };
            let frameworks = library.frameworks().list(&query).await?.results;
            print_out(ctx.json, &frameworks, |f| {
                format!(
                    "{}\t{}\t{}\t{} requirements",
                    f.id,
                    f.code,
                    f.name,
                    f.requirement_count
                )
            })
        }
        FrameworkCommands::Show { id } => {
            let framework = library.frameworks().get(&FrameworkId::new(id)).await?;
            print_one(ctx.json, &framework, |f| {
                fields(&[
                    ("code", f.code.clone()),
                    ("name", f.name.clone()),
                    ("issuer", f.issuing_organization.clone()),
                    ("category", label(&f.category)),
                    ("version", or_dash(f.loaded_library_version.clone())),
                    ("requirements", f.requirement_count.to_string()),
                    ("url", f.official_url.clone()),
                ])
            })
        }
        FrameworkCommands::Requirements { id, tree } => {
            let id = FrameworkId::new(id);
            if tree {
                let roots = library.frameworks().requirements_tree(&id).await?;
                print_one(ctx.json, &roots, |r| {
                    let mut lines = Vec::new();
                    render_requirements(r, 0, &mut lines);
                    lines.join("\n")
                })
            } else {
                let requirements = library.frameworks().requirements(&id).await?;
                print_out(ctx.json, &requirements, |r| {
                    format!(
                        "{}\t{}\t{}{}",
                        r.full_code,
                        label(&r.priority),
                        r.title,
                        if r.is_mandatory { "" } else { " (optional)" }
                    )
                })
            }
        }
        FrameworkCommands::Adopt {
            id,
            target_date,
            scope,
        } => {
            let mut request = AdoptFramework::new(FrameworkId::new(id));
            request.target_completion_date = target_date;
            request.scope_description = scope;
            let adoption = ctx.client.compliance().adoptions().adopt(&request).await?;
            print_one(ctx.json, &adoption, |a| {
                format!(
                    "Adopted {} ({}), status {}",
                    a.framework_name,
                    a.framework_code,
                    label(&a.adoption_status)
                )
            })
        }
        FrameworkCommands::Adoptions { active } => {
            let adoptions = ctx.client.compliance().adoptions();
            let list = if active {
                adoptions.active().await?
            } else {
                adoptions.list(&ListQuery::new()).await?.results
            };
            print_out(ctx.json, &list, |a| {
                let certified = match a.certification_expiry_date {
                    Some(until) if a.is_certified => format!("certified until {}", until),
                    _ if a.is_certified => "certified".to_string(),
                    _ => String::new(),
                };
                format!(
                    "{}\t{}\t{}\t{}",
                    a.id,
                    a.framework_code,
                    label(&a.adoption_status),
                    certified
                )
            })
        }
    }
}
