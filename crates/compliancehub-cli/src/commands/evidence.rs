use anyhow::Context as _;
use compliancehub_client::UploadFile;
use compliancehub_core::{
    AppliedControlId, EvidenceId, EvidenceSummary, EvidenceType, EvidenceUpload, LinkType,
    ListQuery, NewEvidenceLink,
};
use std::path::PathBuf;

use super::Context;
use crate::cli::{EvidenceCommands, EvidenceKind, LinkKind, UploadArgs};
use crate::output::{fields, label, or_dash, percent, print_done, print_one, print_out};

impl From<EvidenceKind> for EvidenceType {
    fn from(kind: EvidenceKind) -> Self {
        match kind {
            EvidenceKind::Policy => EvidenceType::Policy,
            EvidenceKind::Procedure => EvidenceType::Procedure,
            EvidenceKind::Screenshot => EvidenceType::Screenshot,
            EvidenceKind::Report => EvidenceType::Report,
            EvidenceKind::Log => EvidenceType::Log,
            EvidenceKind::Certificate => EvidenceType::Certificate,
            EvidenceKind::Configuration => EvidenceType::Configuration,
            EvidenceKind::ScanResult => EvidenceType::ScanResult,
            EvidenceKind::AuditReport => EvidenceType::AuditReport,
            EvidenceKind::TrainingRecord => EvidenceType::TrainingRecord,
            EvidenceKind::Other => EvidenceType::Other,
        }
    }
}

impl From<LinkKind> for LinkType {
    fn from(kind: LinkKind) -> Self {
        match kind {
            LinkKind::Implementation => LinkType::Implementation,
            LinkKind::Testing => LinkType::Testing,
            LinkKind::Monitoring => LinkType::Monitoring,
            LinkKind::Documentation => LinkType::Documentation,
            LinkKind::Audit => LinkType::Audit,
        }
    }
}

fn evidence_row(e: &EvidenceSummary) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}{}",
        e.id,
        label(&e.verification_status),
        label(&e.evidence_type),
        e.file_size_display,
        e.name,
        if e.is_valid { "" } else { " (expired)" }
    )
}

/// Metadata for an upload. The name falls back to the file name.
fn upload_meta(args: &UploadArgs, file: &UploadFile) -> EvidenceUpload {
    let name = args.name.clone().unwrap_or_else(|| file.name.clone());
    let mut meta = EvidenceUpload::new(name, args.evidence_type.into());
    meta.description = args.description.clone().unwrap_or_default();
    meta.validity_end_date = args.valid_until;
    meta.is_confidential = args.confidential;
    meta
}

pub async fn evidence(ctx: &Context, command: EvidenceCommands) -> anyhow::Result<()> {
    let api = ctx.client.evidence();
    match command {
        EvidenceCommands::List {
            status,
            evidence_type,
            search,
        } => {
            let mut query = ListQuery::new()
                .ordering("-created_at")
                .filter_opt("verification_status", status)
                .filter_opt("evidence_type", evidence_type);
            if let Some(term) = search {
                query = query.search(term);
            }
            let page = api.list(&query).await?;
            print_out(ctx.json, &page.results, evidence_row)
        }
        EvidenceCommands::Show { id } => {
            let evidence = api.get(&EvidenceId::new(id)).await?;
            print_one(ctx.json, &evidence, |e| {
                fields(&[
                    ("name", e.name.clone()),
                    ("type", label(&e.evidence_type)),
                    ("status", label(&e.verification_status)),
                    ("size", e.file_size_display.clone()),
                    ("uploaded by", or_dash(e.uploaded_by_email.clone())),
                    ("verified by", or_dash(e.verified_by_email.clone())),
                    ("valid until", or_dash(e.validity_end_date)),
                    ("sha256", e.file_hash.clone()),
                ])
            })
        }
        EvidenceCommands::Upload(args) => {
            let file = UploadFile::from_path(&args.path).await?;
            let meta = upload_meta(&args, &file);
            let created = api.upload(&meta, &file).await?;
            print_one(ctx.json, &created, |e| {
                format!("Uploaded {} ({}) as {}", e.name, e.file_size_display, e.id)
            })
        }
        EvidenceCommands::Download { id, output } => {
            let file = api.download(&EvidenceId::new(id.clone())).await?;
            let target = output.unwrap_or_else(|| {
                PathBuf::from(file.filename.clone().unwrap_or_else(|| format!("evidence-{}", id)))
            });
            tokio::fs::write(&target, &file.bytes)
                .await
                .with_context(|| format!("failed to write {}", target.display()))?;
            print_done(
                ctx.json,
                &format!("Saved {} bytes to {}", file.bytes.len(), target.display()),
            )
        }
        EvidenceCommands::Approve { id, notes } => {
            let evidence = api.approve(&EvidenceId::new(id), &notes).await?;
            print_one(ctx.json, &evidence, |e| format!("{} approved", e.name))
        }
        EvidenceCommands::Reject { id, reason } => {
            let evidence = api.reject(&EvidenceId::new(id), &reason).await?;
            print_one(ctx.json, &evidence, |e| format!("{} rejected", e.name))
        }
        EvidenceCommands::Pending => {
            let pending = api.pending_approval().await?;
            print_out(ctx.json, &pending, evidence_row)
        }
        EvidenceCommands::Expired => {
            let expired = api.expired().await?;
            print_out(ctx.json, &expired, evidence_row)
        }
        EvidenceCommands::Link {
            evidence,
            control,
            link_type,
        } => {
            let request = NewEvidenceLink {
                applied_control: AppliedControlId::new(control),
                evidence: EvidenceId::new(evidence),
                link_type: link_type.into(),
                notes: None,
                relevance_score: None,
            };
            let link = api.links().link(&request).await?;
            print_one(ctx.json, &link, |l| format!("Linked as {}", l.id))
        }
        EvidenceCommands::Quota => {
            let quota = api.storage_quota().await?;
            print_one(ctx.json, &quota, |q| {
                let mut text = fields(&[
                    ("used", format!("{:.1} MB", q.used_mb)),
                    ("quota", format!("{:.0} MB", q.quota_mb)),
                    ("available", format!("{:.1} MB", q.available_mb)),
                    ("usage", percent(q.usage_percentage)),
                ]);
                if q.is_over_quota {
                    text.push_str("\nOver quota: uploads are refused until files are removed.");
                }
                text
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_name_defaults_to_file_name() {
        let args = UploadArgs {
            path: PathBuf::from("docs/policy.pdf"),
            name: None,
            evidence_type: EvidenceKind::Policy,
            description: None,
            valid_until: None,
            confidential: true,
        };
        let file = UploadFile::new("policy.pdf", b"%PDF".to_vec());
        let meta = upload_meta(&args, &file);
        assert_eq!(meta.name, "policy.pdf");
        assert_eq!(meta.evidence_type, EvidenceType::Policy);
        assert!(meta.is_confidential);
    }

    #[test]
    fn test_upload_name_override() {
        let args = UploadArgs {
            path: PathBuf::from("scan.json"),
            name: Some("Quarterly scan".into()),
            evidence_type: EvidenceKind::ScanResult,
            description: Some("Q3".into()),
            valid_until: None,
            confidential: false,
        };
        let meta = upload_meta(&args, &UploadFile::new("scan.json", Vec::new()));
        assert_eq!(meta.name, "Quarterly scan");
        assert_eq!(meta.description, "Q3");
    }

    #[test]
    fn test_link_kind_maps_to_wire_name() {
        assert_eq!(label(&LinkType::from(LinkKind::Testing)), "testing");
    }
}
