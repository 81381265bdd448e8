use super::ui;
use crate::core::amount;
use crate::core::conversion::RateFetcher;
use crate::core::view::{Converter, ViewState};
use anyhow::{Result, bail};

/// Converts a single amount and prints the resulting form.
pub async fn run(fetcher: RateFetcher, initial: ViewState, amount_text: &str) -> Result<ViewState> {
    if amount::to_canonical(amount_text).is_none() {
        bail!(
            "Invalid amount: {} (use digits, optionally grouped with '{}')",
            amount_text,
            amount::GROUP_SEPARATOR
        );
    }

    let converter = Converter::new(fetcher, initial);
    if let Some(ticket) = converter.edit_amount(amount_text).await {
        let pb = ui::new_spinner(&format!(
            "Converting {} {} to {}...",
            amount::to_display(&ticket.request().amount),
            ticket.request().source,
            ticket.request().target
        ));
        converter.run(ticket).await;
        pb.finish_and_clear();
    }

    let view = converter.snapshot().await;
    println!("{}", ui::render_form(&view));
    Ok(view)
}
