pub(crate) mod delete;
pub(crate) mod list;
pub(crate) mod rename;
pub(crate) mod upload;

use futures::Stream;

use crate::{CommandResult, Context};

/// Autocomplete over the stored track titles, case-insensitive on the
/// typed prefix.
pub(crate) async fn autocomplete_track<'a>(
    ctx: Context<'_>,
    partial: &'a str,
) -> impl Stream<Item = String> + 'a {
    let titles = ctx.data().library.titles_matching(partial).await;
    futures::stream::iter(titles)
}

/// Human formatting for a loop delay.
pub(crate) fn describe_delay(delay: std::time::Duration) -> String {
    if delay.is_zero() {
        "immediately".to_owned()
    } else {
        format!("after {delay:?}")
    }
}
