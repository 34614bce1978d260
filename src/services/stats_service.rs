use std::collections::HashMap;

use crate::error::RegistryError;
use crate::models::MemberRow;
use crate::services::member_service::MemberRegistry;

pub const MSG_STATS_UNAVAILABLE: &str = "No se pudieron cargar las estadísticas";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountView {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overview {
    pub total_members: usize,
    pub by_section: Vec<CountView>,
    pub by_workgroup: Vec<CountView>,
}

pub async fn load_overview(registry: &MemberRegistry) -> Result<Overview, RegistryError> {
    let members = registry.list_all().await?;
    Ok(summarize(&members))
}

pub fn summarize(members: &[MemberRow]) -> Overview {
    Overview {
        total_members: members.len(),
        by_section: count_by(members, |m| m.section.as_str()),
        by_workgroup: count_by(members, |m| m.workgroup.as_str()),
    }
}

// Most frequent first; ties by label so the page is stable between reloads.
fn count_by<'a, F>(members: &'a [MemberRow], key: F) -> Vec<CountView>
where
    F: Fn(&'a MemberRow) -> &'a str,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for m in members {
        *counts.entry(key(m)).or_default() += 1;
    }
    let mut out: Vec<CountView> = counts
        .into_iter()
        .map(|(label, count)| CountView {
            label: label.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(section: &str, group: &str) -> MemberRow {
        MemberRow {
            id: format!("{section}-{group}"),
            name: "N".to_string(),
            surname: "S".to_string(),
            nip: "000000".to_string(),
            section: section.to_string(),
            workgroup: group.to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn counts_are_sorted_by_frequency_then_label() {
        let members = vec![
            member("GOA", "Grupo 2"),
            member("Patrullas", "Grupo 1"),
            member("GOA", "Grupo 1"),
            member("Motorista", "Grupo 9"),
        ];
        let overview = summarize(&members);
        assert_eq!(overview.total_members, 4);
        assert_eq!(
            overview.by_section,
            vec![
                CountView { label: "GOA".to_string(), count: 2 },
                CountView { label: "Motorista".to_string(), count: 1 },
                CountView { label: "Patrullas".to_string(), count: 1 },
            ]
        );
        assert_eq!(overview.by_workgroup[0], CountView { label: "Grupo 1".to_string(), count: 2 });
    }

    #[test]
    fn empty_registry_has_no_breakdown() {
        assert_eq!(summarize(&[]), Overview::default());
    }
}
