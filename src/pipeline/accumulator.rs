use crate::config::LinkMerge;
use crate::types::AccountDraft;
use std::collections::HashMap;
use tracing::debug;

/// Collects account drafts for one import run, merging rows that share a
/// display name. Drafts are kept in the order their names were first seen.
#[derive(Debug, Default)]
pub struct AccountAccumulator {
    link_merge: LinkMerge,
    drafts: Vec<AccountDraft>,
    by_name: HashMap<String, usize>,
}

impl AccountAccumulator {
    pub fn new(link_merge: LinkMerge) -> Self {
        Self {
            link_merge,
            drafts: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Record a data row for `name` and return its draft.
    ///
    /// An unseen name creates a draft with the given category, link and
    /// username. For a known name the category never changes; the link and
    /// username are taken from this row only if the row carries a link and
    /// the merge policy allows it.
    pub fn observe(
        &mut self,
        name: &str,
        category: &str,
        link: Option<String>,
        username: Option<String>,
    ) -> &mut AccountDraft {
        let name = display_name(name);
        let index = match self.by_name.get(&name) {
            Some(&index) => {
                let draft = &mut self.drafts[index];
                if link.is_some() && should_replace_link(self.link_merge, draft) {
                    debug!(account = %draft.name, "Back-filling account link");
                    draft.link = link;
                    draft.username = username;
                }
                index
            }
            None => {
                let index = self.drafts.len();
                self.by_name.insert(name.clone(), index);
                self.drafts.push(AccountDraft {
                    name,
                    category: category.to_string(),
                    link,
                    username,
                    history: Vec::new(),
                });
                index
            }
        };
        &mut self.drafts[index]
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&AccountDraft> {
        self.by_name
            .get(&display_name(name))
            .map(|&index| &self.drafts[index])
    }

    pub fn into_drafts(self) -> Vec<AccountDraft> {
        self.drafts
    }
}

fn should_replace_link(policy: LinkMerge, draft: &AccountDraft) -> bool {
    match policy {
        LinkMerge::FirstValid => draft.username.is_none(),
        LinkMerge::LatestValid => true,
    }
}

/// Sheet cells sometimes wrap long names over several lines or carry stray
/// spaces. The flattened form is both the stored name and the merge key.
fn display_name(raw: &str) -> String {
    raw.replace("\r\n", " ").replace('\n', " ").trim().to_string()
}
