use compliancehub_core::{
    ComplianceGap, DepartmentId, FrameworkId, GenerateReport, ListQuery, ReportFormat, ReportType,
};
use serde_json::json;

use super::Context;
use crate::cli::{ComplianceCommands, ReportFileFormat, ReportKind};
use crate::output::{fields, label, or_dash, percent, print_done, print_one, print_out};

impl From<ReportKind> for ReportType {
    fn from(kind: ReportKind) -> Self {
        match kind {
            ReportKind::Summary => ReportType::Summary,
            ReportKind::Detailed => ReportType::Detailed,
            ReportKind::GapAnalysis => ReportType::GapAnalysis,
            ReportKind::EvidenceMatrix => ReportType::EvidenceMatrix,
            ReportKind::ControlMatrix => ReportType::ControlMatrix,
            ReportKind::AuditReport => ReportType::AuditReport,
        }
    }
}

impl From<ReportFileFormat> for ReportFormat {
    fn from(format: ReportFileFormat) -> Self {
        match format {
            ReportFileFormat::Pdf => ReportFormat::Pdf,
            ReportFileFormat::Excel => ReportFormat::Excel,
            ReportFileFormat::Csv => ReportFormat::Csv,
            ReportFileFormat::Json => ReportFormat::Json,
        }
    }
}

fn gap_row(g: &ComplianceGap) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\tdue {}",
        g.id,
        g.severity.as_str(),
        label(&g.status),
        g.requirement_code,
        g.requirement_title,
        or_dash(g.remediation_due_date)
    )
}

pub async fn compliance(ctx: &Context, command: ComplianceCommands) -> anyhow::Result<()> {
    let api = ctx.client.compliance();
    match command {
        ComplianceCommands::Overview => {
            let overview = api.overview().await?;
            print_one(ctx.json, &overview, |o| {
                let mut text = fields(&[
                    ("frameworks", o.total_frameworks.to_string()),
                    ("avg score", percent(o.avg_compliance_score)),
                    ("avg coverage", percent(o.avg_coverage)),
                ]);
                for f in &o.frameworks {
                    text.push_str(&format!(
                        "\n  {:<12}{:>7}  {:<3} coverage {}  {} gaps",
                        f.framework_code,
                        percent(f.compliance_score),
                        f.grade,
                        percent(f.coverage_percentage),
                        f.gap_count
                    ));
                }
                text
            })
        }
        ComplianceCommands::Calculate {
            framework,
            all,
            department,
        } => {
            if all {
                let scored = api.calculate_all().await?;
                return print_out(ctx.json, &scored.results, |s| {
                    format!("{}\t{}\t{}", s.framework, percent(s.score), s.grade)
                });
            }
            let Some(framework) = framework else {
                anyhow::bail!("Give a framework id, or --all to score every adopted framework");
            };
            let department = department.map(DepartmentId::new);
            let result = api
                .calculate(&FrameworkId::new(framework), department.as_ref())
                .await?;
            print_one(ctx.json, &result, |r| {
                format!(
                    "{}: {} ({}), coverage {}, {} of {} requirements compliant",
                    r.framework_code,
                    percent(r.compliance_score),
                    r.compliance_grade,
                    percent(r.coverage_percentage),
                    r.requirements_compliant,
                    r.total_requirements
                )
            })
        }
        ComplianceCommands::Results => {
            let current = api.current().await?;
            print_out(ctx.json, &current, |r| {
                format!(
                    "{}\t{}\t{}\t{}\t{} gaps",
                    r.framework_code,
                    percent(r.compliance_score),
                    r.compliance_grade,
                    or_dash(r.calculation_date.map(|d| d.date_naive())),
                    r.gap_count
                )
            })
        }
        ComplianceCommands::Gaps { severity, overdue } => {
            let gaps = if overdue {
                api.gaps().overdue().await?
            } else {
                let query = ListQuery::new()
                    .ordering("remediation_due_date")
                    .filter_opt("severity", severity);
                api.gaps().list(&query).await?.results
            };
            print_out(ctx.json, &gaps, gap_row)
        }
        ComplianceCommands::Trends { framework, months } => {
            let points = api.trends(&FrameworkId::new(framework), months).await?;
            print_out(ctx.json, &points, |p| {
                format!(
                    "{}\t{}\t{}\tcoverage {}",
                    p.date,
                    percent(p.compliance_score),
                    p.grade,
                    percent(p.coverage_percentage)
                )
            })
        }
        ComplianceCommands::Recommendations { framework } => {
            let recommendations = api.recommendations(&FrameworkId::new(framework)).await?;
            print_out(ctx.json, &recommendations, |r| {
                format!(
                    "[{}] {}\n    {}\n    impact: {}",
                    r.priority.as_str(),
                    r.title,
                    r.description,
                    r.estimated_impact
                )
            })
        }
        ComplianceCommands::Report {
            report_type,
            format,
            framework,
            title,
        } => {
            let request = GenerateReport {
                report_type: report_type.into(),
                report_format: format.into(),
                framework: framework.map(FrameworkId::new),
                title,
                ..GenerateReport::default()
            };
            let report = api.reports().generate(&request).await?;
            print_one(ctx.json, &report, |r| {
                format!(
                    "Report {} queued ({}). Status: {}",
                    r.id,
                    r.title,
                    label(&r.generation_status)
                )
            })
        }
    }
}

/// One screen combining the compliance overview, control dashboard and
/// evidence backlog. The four reads run concurrently.
pub async fn dashboard(ctx: &Context) -> anyhow::Result<()> {
    let compliance = ctx.client.compliance();
    let applied = ctx.client.controls().applied();
    let evidence = ctx.client.evidence();
    let (overview, controls, quota, pending) = futures::try_join!(
        compliance.overview(),
        applied.dashboard(),
        evidence.storage_quota(),
        evidence.pending_approval(),
    )?;

    if ctx.json {
        return print_one(
            true,
            json!({
                "compliance": overview,
                "controls": controls,
                "storage": quota,
                "pending_evidence": pending.len(),
            }),
            |_| String::new(),
        );
    }

    println!(
        "{}",
        fields(&[
            ("frameworks", overview.total_frameworks.to_string()),
            ("avg score", percent(overview.avg_compliance_score)),
            ("controls", controls.total_controls.to_string()),
            ("overdue reviews", controls.overdue_reviews.to_string()),
            ("deficient", controls.controls_with_deficiencies.to_string()),
            ("pending evidence", pending.len().to_string()),
            ("storage", percent(quota.usage_percentage)),
        ])
    );
    for f in &overview.frameworks {
        println!(
            "  {:<12}{:>7}  {}",
            f.framework_code,
            percent(f.compliance_score),
            f.grade
        );
    }
    if quota.is_over_quota {
        print_done(false, "Storage quota exceeded.")?;
    }
    Ok(())
}
