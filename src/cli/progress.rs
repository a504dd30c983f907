use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Byte-based progress bar; falls back to a spinner when the input size is
/// unknown (pipes).
pub fn create_progress_bar(
    multi: &MultiProgress,
    total_bytes: Option<u64>,
    message: &'static str,
) -> Result<ProgressBar> {
    let pb = if let Some(total) = total_bytes {
        let pb = multi.add(ProgressBar::new(total));
        pb.set_style(ProgressStyle::with_template(
            "{bar:40.cyan/blue} {bytes}/{total_bytes} ({percent}%)\n{msg} | elapsed: {elapsed_precise} | ETA: {eta_precise}",
        )?);

        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    } else {
        let pb = multi.add(ProgressBar::new_spinner());
        pb.set_style(ProgressStyle::with_template(
            "{spinner:.green} {bytes}\n{msg} | elapsed: {elapsed_precise}",
        )?);

        pb
    };
    pb.set_message(message);
    Ok(pb)
}

pub fn update_progress(pb: Option<&ProgressBar>, bytes: usize, bursts: u64) {
    if let Some(pb) = pb {
        pb.inc(bytes as u64);
        pb.set_message(format!("{bursts} bursts"));
    }
}

/// Moves the bar to an absolute position, for callers that track input
/// consumption themselves.
pub fn set_progress(pb: Option<&ProgressBar>, position: u64, bursts: u64) {
    if let Some(pb) = pb {
        pb.set_position(position);
        pb.set_message(format!("{bursts} bursts"));
    }
}

pub fn finish_progress(pb: Option<ProgressBar>) {
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
}
