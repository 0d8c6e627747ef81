//! Debounced background rank recompute for [`RankPolicy::Debounced`].
//!
//! [`RankPolicy::Debounced`]: crate::RankPolicy::Debounced

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::{sync::Notify, task::JoinHandle};

use crate::store::{RankCache, materialize_full};

/// Owns the background task. Dropping the last handle stops it.
pub(crate) struct RankRefresher {
  notify: Arc<Notify>,
  task:   JoinHandle<()>,
}

impl RankRefresher {
  pub(crate) fn spawn(
    conn: tokio_rusqlite::Connection,
    cache: Arc<Mutex<RankCache>>,
    delay: Duration,
  ) -> Self {
    let notify = Arc::new(Notify::new());
    let task = tokio::spawn(run(conn, cache, notify.clone(), delay));
    Self { notify, task }
  }

  /// Signal that the log has grown. Signals arriving within `delay` of each
  /// other collapse into a single recompute.
  pub(crate) fn schedule(&self) { self.notify.notify_one(); }
}

impl Drop for RankRefresher {
  fn drop(&mut self) { self.task.abort(); }
}

async fn run(
  conn: tokio_rusqlite::Connection,
  cache: Arc<Mutex<RankCache>>,
  notify: Arc<Notify>,
  delay: Duration,
) {
  loop {
    notify.notified().await;

    // Wait until the log has been quiet for `delay`.
    loop {
      tokio::select! {
        () = notify.notified() => {}
        () = tokio::time::sleep(delay) => break,
      }
    }

    let target = cache.clone();
    match conn.call(move |conn| Ok(materialize_full(conn, &target)?)).await {
      Ok(changed) => tracing::debug!(changed, "background rank refresh complete"),
      Err(e) => tracing::warn!(error = %e, "background rank refresh failed"),
    }
  }
}
