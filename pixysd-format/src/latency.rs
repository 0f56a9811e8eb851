
use crate::header::FrameHeader;

/// Card write latency over one recording session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatencyStats {
    /// Number of timed writes
    pub count: u32,
    pub min_us: u32,
    pub max_us: u32,
    pub mean_us: f64,
    /// Share of writes slower than the threshold [percent]
    pub pct_above: f64,
}

/// Default threshold for a "slow" write
pub const SLOW_WRITE_US: u32 = 20_000;

/// Collect write latency statistics from the headers of one session.
///
/// Headers are consumed in order until one is corrupted or belongs to a
/// different session than the first, which is where the session's frames
/// end. Headers without a timing (zero, or no such field) are skipped.
///
/// Returns `None` if no timed write was seen.
pub fn aggregate<I>(headers: I, threshold_us: u32) -> Option<LatencyStats>
    where I: IntoIterator<Item = FrameHeader>
{
    let mut session = None;
    let mut count: u32 = 0;
    let mut sum: u64 = 0;
    let mut min = u32::MAX;
    let mut max = 0;
    let mut above: u32 = 0;

    for hdr in headers {
        if !hdr.valid {
            break;
        }
        match session {
            None => session = Some(hdr.session_count),
            Some(s) if s != hdr.session_count => break,
            Some(_) => {},
        }

        let us = match hdr.last_write_time_us {
            Some(0) | None => continue,
            Some(us) => us,
        };
        count += 1;
        sum += us as u64;
        min = min.min(us);
        max = max.max(us);
        if us > threshold_us {
            above += 1;
        }
    }

    if count == 0 {
        return None;
    }
    Some(LatencyStats {
        count,
        min_us: min,
        max_us: max,
        mean_us: sum as f64 / count as f64,
        pct_above: above as f64 * 100.0 / count as f64,
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    fn hdr(session: u32, write_us: u32) -> FrameHeader {
        FrameHeader {
            session_count: session,
            last_write_time_us: Some(write_us),
            valid: true,
            ..Default::default()
        }
    }

    #[test]
    fn empty_sequence_has_no_data() {
        assert_eq!(aggregate(Vec::new(), SLOW_WRITE_US), None);
    }

    #[test]
    fn untimed_writes_only_has_no_data() {
        let headers = vec![hdr(1, 0), hdr(1, 0)];
        assert_eq!(aggregate(headers, SLOW_WRITE_US), None);
    }

    #[test]
    fn reference_session() {
        let headers = [5000, 8000, 12000, 0, 25000].map(|us| hdr(3, us));
        let stats = aggregate(headers, 20_000).unwrap();
        assert_eq!(stats, LatencyStats {
            count: 4,
            min_us: 5000,
            max_us: 25000,
            mean_us: 12500.0,
            pct_above: 25.0,
        });
    }

    #[test]
    fn stops_at_session_boundary() {
        let headers = vec![hdr(3, 1000), hdr(3, 3000), hdr(2, 90_000), hdr(3, 90_000)];
        let stats = aggregate(headers, SLOW_WRITE_US).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.max_us, 3000);
        assert_eq!(stats.pct_above, 0.0);
    }

    #[test]
    fn stops_at_corrupted_header() {
        let mut bad = hdr(3, 50_000);
        bad.valid = false;
        let headers = vec![hdr(3, 1000), bad, hdr(3, 2000)];
        let stats = aggregate(headers, SLOW_WRITE_US).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.min_us, 1000);
    }

    #[test]
    fn corrupted_first_header_has_no_data() {
        let mut bad = hdr(3, 50_000);
        bad.valid = false;
        assert_eq!(aggregate(vec![bad, hdr(3, 1000)], SLOW_WRITE_US), None);
    }

    #[test]
    fn consumes_lazily() {
        // Stops pulling from the source as soon as the session ends
        let mut pulled = 0;
        let source = (0..100u32).map(|i| {
            pulled += 1;
            hdr(if i < 3 { 7 } else { 8 }, 100 + i)
        });
        let stats = aggregate(source, SLOW_WRITE_US).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(pulled, 4);
    }
}
