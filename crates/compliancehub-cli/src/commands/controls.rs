use compliancehub_core::{
    AppliedControlSummary, ApplyControlRequest, ApplyFrameworkControlsRequest, DepartmentId,
    FrameworkId, ListQuery, ReferenceControlId,
};

use super::Context;
use crate::cli::ControlCommands;
use crate::output::{fields, label, or_dash, percent, print_done, print_one, print_out};

fn control_row(c: &AppliedControlSummary) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}{}",
        c.id,
        c.reference_control_code,
        label(&c.status),
        or_dash(c.department_name.clone()),
        c.reference_control_name,
        if c.has_deficiencies { " (deficient)" } else { "" }
    )
}

pub async fn controls(ctx: &Context, command: ControlCommands) -> anyhow::Result<()> {
    let applied = ctx.client.controls().applied();
    match command {
        ControlCommands::List { status, search } => {
            let mut query = ListQuery::new()
                .ordering("reference_control__code")
                .filter_opt("status", status);
            if let Some(term) = search {
                query = query.search(term);
            }
            let page = applied.list(&query).await?;
            print_out(ctx.json, &page.results, control_row)
        }
        ControlCommands::Apply {
            reference_control,
            department,
        } => {
            let mut request = ApplyControlRequest::new(ReferenceControlId::new(reference_control));
            request.department = department.map(DepartmentId::new);
            let control = applied.apply_control(&request).await?;
            print_one(ctx.json, &control, |c| {
                format!(
                    "Applied {} {} as {}",
                    c.reference_control_code,
                    c.reference_control_name,
                    c.id
                )
            })
        }
        ControlCommands::ApplyFramework {
            framework,
            department,
        } => {
            let request = ApplyFrameworkControlsRequest {
                framework: FrameworkId::new(framework),
                department: department.map(DepartmentId::new),
            };
            let result = applied.apply_framework_controls(&request).await?;
            print_done(ctx.json, &result.message)
        }
        ControlCommands::Dashboard => {
            let dashboard = applied.dashboard().await?;
            print_one(ctx.json, &dashboard, |d| {
                let mut text = fields(&[
                    ("controls", d.total_controls.to_string()),
                    ("avg score", percent(d.avg_compliance_score)),
                    ("overdue", d.overdue_reviews.to_string()),
                    ("deficient", d.controls_with_deficiencies.to_string()),
                ]);
                for s in &d.status_breakdown {
                    text.push_str(&format!("\n  {:<16}{}", label(&s.status), s.count));
                }
                text
            })
        }
        ControlCommands::Overdue => {
            let overdue = applied.overdue_reviews().await?;
            print_out(ctx.json, &overdue, |c| {
                format!("{}\tdue {}", control_row(c), or_dash(c.next_review_date))
            })
        }
        ControlCommands::Deficient => {
            let deficient = applied.with_deficiencies().await?;
            print_out(ctx.json, &deficient, control_row)
        }
    }
}
