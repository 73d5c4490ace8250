use crate::dom::{DomNode, PageDom};
use crate::layout::PageLayout;
use crate::text::first_integer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandOutcome {
    /// No count indicator, or it carried no number.
    NoIndicator,
    /// Everything is already visible.
    Complete { total: u64 },
    /// No "show more" control mentions the hidden remainder.
    NoControl { remaining: u64 },
    Activated { remaining: u64 },
    Failed { remaining: u64 },
}

/// Terms hidden behind the "show more" control, if the set is large enough to have one.
pub fn remaining_after_threshold(total: u64, threshold: u64) -> Option<u64> {
    (total > threshold).then(|| total - threshold)
}

/// Best-effort click on the "show more" control of a truncated set.
///
/// Never fails: problems are logged and reported through the outcome only.
pub fn auto_expand<D: PageDom>(dom: &D, layout: &PageLayout) -> ExpandOutcome {
    let selectors = &layout.selectors;
    let Some(total) = dom
        .select_first(&selectors.set_count)
        .and_then(|node| first_integer(&node.inner_text()))
    else {
        return ExpandOutcome::NoIndicator;
    };

    let Some(remaining) = remaining_after_threshold(total, layout.expand_threshold) else {
        return ExpandOutcome::Complete { total };
    };

    let needle = remaining.to_string();
    let control = dom
        .select_all(&selectors.show_more_button)
        .into_iter()
        .find(|button| button.inner_text().contains(&needle));
    let Some(control) = control else {
        tracing::debug!(total, remaining, "no show-more control for remaining terms");
        return ExpandOutcome::NoControl { remaining };
    };

    tracing::info!(remaining, "found show-more control; activating");
    match dom.activate(&control) {
        Ok(()) => ExpandOutcome::Activated { remaining },
        Err(err) => {
            tracing::warn!(remaining, err = %format!("{err:#}"), "auto-expand failed");
            ExpandOutcome::Failed { remaining }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::fake::{FakeNode, FakePage};

    fn page(layout: &PageLayout, indicator: &str, buttons: &[&str]) -> FakePage {
        FakePage::new("https://quizlet.com/1/")
            .with(&layout.selectors.set_count, vec![FakeNode::text(indicator)])
            .with(
                &layout.selectors.show_more_button,
                buttons.iter().map(|label| FakeNode::text(label)).collect(),
            )
    }

    #[test]
    fn remainder_is_total_minus_threshold() {
        assert_eq!(remaining_after_threshold(150, 100), Some(50));
        assert_eq!(remaining_after_threshold(100, 100), None);
        assert_eq!(remaining_after_threshold(3, 100), None);
    }

    #[test]
    fn activates_only_the_control_naming_the_remainder() {
        let layout = PageLayout::default();
        let page = page(
            &layout,
            "Terms in this set (150)",
            &["Share", "See 49 more terms", "See 50 more terms", "See 50 again"],
        );
        assert_eq!(
            auto_expand(&page, &layout),
            ExpandOutcome::Activated { remaining: 50 }
        );
        assert_eq!(*page.activated.borrow(), vec!["See 50 more terms".to_owned()]);
    }

    #[test]
    fn small_sets_are_left_alone() {
        let layout = PageLayout::default();
        let page = page(&layout, "Terms in this set (100)", &["See 0 more"]);
        assert_eq!(
            auto_expand(&page, &layout),
            ExpandOutcome::Complete { total: 100 }
        );
        assert!(page.activated.borrow().is_empty());
    }

    #[test]
    fn missing_control_or_indicator_is_not_an_error() {
        let layout = PageLayout::default();
        let page = page(&layout, "Terms in this set (150)", &["See 49 more"]);
        assert_eq!(
            auto_expand(&page, &layout),
            ExpandOutcome::NoControl { remaining: 50 }
        );

        let bare = FakePage::new("https://quizlet.com/1/");
        assert_eq!(auto_expand(&bare, &layout), ExpandOutcome::NoIndicator);
    }

    #[test]
    fn activation_errors_are_swallowed() {
        let layout = PageLayout::default();
        let mut page = page(&layout, "(250)", &["See 150 more"]);
        page.fail_activation = true;
        assert_eq!(
            auto_expand(&page, &layout),
            ExpandOutcome::Failed { remaining: 150 }
        );
    }
}
