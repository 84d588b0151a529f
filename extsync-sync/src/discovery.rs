//! Subscription discovery across every visible organisation.
//!
//! Failure policy:
//!
//! | Step                      | On failure                      |
//! |---------------------------|---------------------------------|
//! | list organisations        | fatal                           |
//! | list repositories of org  | logged, organisation skipped    |
//! | read manifest (not found) | repository has no subscriptions |
//! | read manifest (other)     | logged, repository skipped      |
//! | parse manifest            | fatal                           |

use extsync_core::host::HostApi;
use extsync_core::manifest::{SubscriptionManifest, MANIFEST_PATH};
use extsync_core::types::{SubscribedRepository, SubscriptionId};

use crate::SyncError;

/// Find every repository subscribed to one of `extension_paths` in
/// `source_org/source_repo`.
///
/// Order: organisation listing order, then repository listing order, then
/// manifest order. A repository subscribed twice appears twice.
pub fn find_subscribers(
    host: &dyn HostApi,
    source_org: &str,
    source_repo: &str,
    extension_paths: &[String],
) -> Result<Vec<SubscribedRepository>, SyncError> {
    if extension_paths.is_empty() {
        return Ok(vec![]);
    }
    let wanted: Vec<(String, SubscriptionId)> = extension_paths
        .iter()
        .map(|path| {
            let id = SubscriptionId::new(source_org, source_repo, path.as_str());
            (id.encoded(), id)
        })
        .collect();

    let orgs = host.list_organizations().map_err(SyncError::Organizations)?;
    let mut subscribers = Vec::new();

    for org in &orgs {
        let repos = match host.list_repositories(org) {
            Ok(repos) => repos,
            Err(e) => {
                tracing::warn!("skipping organization {org}: {e}");
                continue;
            }
        };
        for repo in repos {
            let location = format!("{}/{}", repo.organization, repo.name);
            let bytes = match host.read_file(
                &repo.organization,
                &repo.name,
                MANIFEST_PATH,
                &repo.default_branch,
            ) {
                Ok(bytes) => bytes,
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    tracing::warn!("could not read manifest of {location}: {e}");
                    continue;
                }
            };
            let manifest = SubscriptionManifest::parse(&bytes, &location)?;

            for declared in &manifest.subscriptions {
                for (encoded, id) in &wanted {
                    if declared == encoded {
                        tracing::debug!("{location} subscribes to {encoded}");
                        subscribers.push(SubscribedRepository {
                            organization: repo.organization.clone(),
                            repository: repo.name.clone(),
                            target_branch: repo.default_branch.clone(),
                            target_directory: id.extension_path.clone(),
                            subscription_id: id.clone(),
                        });
                    }
                }
            }
        }
    }

    tracing::info!(
        "found {} subscribers of {source_org}/{source_repo} across {} organizations",
        subscribers.len(),
        orgs.len()
    );
    Ok(subscribers)
}
