//! Read-only activity feeds: ad network events, tracking and the admin log.

use ym_core::store::Feed;

use super::feed;
use crate::rpc::Procedure;

pub(super) fn procedures() -> Vec<Procedure> {
    vec![
        feed("monetag.events", Feed::MonetagEvents),
        feed("monetag.postbacks", Feed::MonetagPostbacks),
        feed("tracking.events", Feed::TrackingEvents),
        feed("adminLogs.list", Feed::AdminLogs),
    ]
}
