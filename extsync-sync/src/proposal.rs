//! Merge-proposal publisher.

use extsync_core::host::{HostApi, MergeProposal, MergeProposalRequest};
use extsync_core::types::{ReleaseInfo, SubscribedRepository};
use extsync_renderer::{ProposalContext, Renderer};

use crate::SyncError;

/// Version shown in the proposal body.
///
/// The release tag when set, else the last `-` segment of the branch name,
/// else `"unknown"`.
pub fn resolve_version(release: Option<&ReleaseInfo>, branch: &str) -> String {
    if let Some(tag) = release.map(|r| r.tag_name.trim()).filter(|t| !t.is_empty()) {
        return tag.to_string();
    }
    branch
        .rsplit_once('-')
        .map(|(_, tail)| tail)
        .filter(|tail| !tail.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

pub fn title(extension_name: &str, version: &str) -> String {
    format!("Update {extension_name} to {version}")
}

/// Everything the publisher needs beyond the host and renderer.
#[derive(Debug, Clone)]
pub struct ProposalInput<'a> {
    pub extension_name: &'a str,
    /// Version used in the title.
    pub version: &'a str,
    /// `org/repo` of the source.
    pub source: &'a str,
    pub branch: &'a str,
    pub release: Option<&'a ReleaseInfo>,
    pub files_created: usize,
    pub files_updated: usize,
    pub files_deleted: usize,
}

/// Render the body and open a proposal from `input.branch` into the
/// subscriber's default branch.
pub fn publish(
    host: &dyn HostApi,
    renderer: &Renderer,
    subscriber: &SubscribedRepository,
    input: &ProposalInput<'_>,
) -> Result<MergeProposal, SyncError> {
    let body = renderer.render_proposal(&context(input))?;
    let request = MergeProposalRequest {
        organization: subscriber.organization.clone(),
        repository: subscriber.repository.clone(),
        title: title(input.extension_name, input.version),
        body,
        head: input.branch.to_string(),
        base: subscriber.target_branch.clone(),
    };
    let proposal = host.create_merge_proposal(&request)?;
    tracing::info!("opened #{} on {}: {}", proposal.number, subscriber.full_name(), proposal.url);
    Ok(proposal)
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

fn context(input: &ProposalInput<'_>) -> ProposalContext {
    ProposalContext {
        extension_name: input.extension_name.to_string(),
        version: resolve_version(input.release, input.branch),
        source: input.source.to_string(),
        branch: input.branch.to_string(),
        release_url: non_blank(input.release.and_then(|r| r.html_url.as_ref())),
        release_notes: non_blank(input.release.and_then(|r| r.body.as_ref())),
        files_created: input.files_created,
        files_updated: input.files_updated,
        files_deleted: input.files_deleted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extsync_core::memory::MemoryHost;
    use extsync_core::types::SubscriptionId;

    fn release(tag: &str) -> ReleaseInfo {
        ReleaseInfo {
            tag_name: tag.into(),
            body: Some("Fixed things".into()),
            html_url: Some("https://git.example.com/acme/platform/releases/tag/v1.2.0".into()),
            ..ReleaseInfo::default()
        }
    }

    #[test]
    fn version_prefers_release_tag() {
        assert_eq!(resolve_version(Some(&release("v1.2.0")), "update-x-9.9.9"), "v1.2.0");
    }

    #[test]
    fn version_falls_back_to_branch_tail() {
        assert_eq!(resolve_version(Some(&release("")), "update-x-9.9.9"), "9.9.9");
        assert_eq!(resolve_version(None, "update-test-ext-2.3.4"), "2.3.4");
    }

    #[test]
    fn version_unknown_without_hyphen() {
        assert_eq!(resolve_version(None, "main"), "unknown");
        assert_eq!(resolve_version(None, "trailing-"), "unknown");
    }

    #[test]
    fn publish_opens_proposal_against_default_branch() {
        let host = MemoryHost::new();
        let subscriber = SubscribedRepository {
            organization: "contoso".into(),
            repository: "app".into(),
            target_branch: "develop".into(),
            target_directory: "src/Acme.Payments".into(),
            subscription_id: SubscriptionId::new("acme", "platform", "src/Acme.Payments"),
        };
        let release = release("v1.2.0");
        let input = ProposalInput {
            extension_name: "Payments",
            version: "v1.2.0",
            source: "acme/platform",
            branch: "update-payments-1.2.0",
            release: Some(&release),
            files_created: 1,
            files_updated: 0,
            files_deleted: 0,
        };
        let proposal = publish(&host, &Renderer::new().unwrap(), &subscriber, &input).unwrap();

        assert_eq!(proposal.number, 1);
        let sent = &host.proposals()[0];
        assert_eq!(sent.title, "Update Payments to v1.2.0");
        assert_eq!(sent.head, "update-payments-1.2.0");
        assert_eq!(sent.base, "develop");
        assert!(sent.body.contains("Fixed things"));
        assert!(sent.body.contains("releases/tag/v1.2.0"));
    }

    #[test]
    fn blank_notes_render_placeholder() {
        let mut release = release("v1");
        release.body = Some("   ".into());
        let input = ProposalInput {
            extension_name: "E",
            version: "v1",
            source: "a/b",
            branch: "update-e-1",
            release: Some(&release),
            files_created: 0,
            files_updated: 0,
            files_deleted: 0,
        };
        assert_eq!(context(&input).release_notes, None);
    }
}
