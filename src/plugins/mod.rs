//! Extensions shipped with the aggregator. They hook in like any other
//! extension and do nothing until configured.

pub mod article_filter;
pub mod links;
pub mod select_feeds;
pub mod truncate;

use crate::hooks::HookRegistry;

pub fn register_builtin(hooks: &mut HookRegistry) {
    article_filter::register(hooks);
    select_feeds::register(hooks);
    links::register(hooks);
    truncate::register(hooks);
}
