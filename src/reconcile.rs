use tracing::{debug, warn};

use crate::types::{AnalysisResult, CandidateItem};

/// Map the analysis' human-readable app names back to stable candidate ids,
/// one id list per niche in source order.
///
/// Matching is a case-insensitive substring check in either direction and the
/// first hit wins. The reasoning service occasionally invents or abbreviates
/// a name; those stay unmatched with a warning and the run carries on, so a
/// niche's id list may be shorter than its featured-app list.
pub fn reconcile(analysis: &AnalysisResult, candidates: &[CandidateItem]) -> Vec<Vec<String>> {
    analysis
        .niches
        .iter()
        .map(|niche| {
            let mut app_ids = Vec::new();
            for app in &niche.apps {
                match find_candidate(&app.name, candidates) {
                    Some(pick) => {
                        debug!("Matched \"{}\" -> {}", app.name, pick.app_id);
                        app_ids.push(pick.app_id.clone());
                    }
                    None => warn!("\"{}\" not found in daily picks, skipping", app.name),
                }
            }
            app_ids
        })
        .collect()
}

fn find_candidate<'a>(featured_name: &str, candidates: &'a [CandidateItem]) -> Option<&'a CandidateItem> {
    let featured = featured_name.to_lowercase();
    candidates.iter().find(|pick| {
        let name = pick.name.to_lowercase();
        name.contains(&featured) || featured.contains(&name)
    })
}
