use std::path::Path;
use std::sync::Mutex;

use crate::detection::domain::object_scanner::{ObjectScanner, ScanError};
use crate::detection::infrastructure::detector_model::ModelError;
use crate::detection::infrastructure::fhog_scanner::FhogScanner;
use crate::shared::pixel_matrix::PixelMatrix;
use crate::shared::rectangle::Rectangle;

/// Shares one scanner between threads.
///
/// Scans are serialized behind a mutex held only for the duration of the
/// scan. Results are sorted by `(left, top, right, bottom)` so that
/// repeated runs on the same image agree.
pub struct DetectionEngine {
    scanner: Mutex<Box<dyn ObjectScanner>>,
}

impl DetectionEngine {
    pub fn new(scanner: Box<dyn ObjectScanner>) -> Self {
        Self {
            scanner: Mutex::new(scanner),
        }
    }

    pub fn from_model_file(path: &Path) -> Result<Self, ModelError> {
        Ok(Self::new(Box::new(FhogScanner::from_file(path)?)))
    }

    pub fn detect(&self, image: &PixelMatrix) -> Result<Vec<Rectangle>, ScanError> {
        let detections = {
            let mut scanner = self.scanner.lock().unwrap_or_else(|poisoned| {
                log::warn!("Recovering detection engine after a panicked scan");
                self.scanner.clear_poison();
                poisoned.into_inner()
            });
            scanner.scan(image)?
        };
        if detections.is_empty() {
            return Ok(Vec::new());
        }

        let mut rects: Vec<Rectangle> = detections.into_iter().map(|d| d.rect).collect();
        rects.sort();
        Ok(rects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::object_scanner::Detection;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    // --- Stubs ---

    struct StubScanner {
        result: Result<Vec<Detection>, ScanError>,
    }

    impl ObjectScanner for StubScanner {
        fn scan(&mut self, _image: &PixelMatrix) -> Result<Vec<Detection>, ScanError> {
            self.result.clone()
        }
    }

    struct PanicOnceScanner {
        panicked: bool,
    }

    impl ObjectScanner for PanicOnceScanner {
        fn scan(&mut self, _image: &PixelMatrix) -> Result<Vec<Detection>, ScanError> {
            if !self.panicked {
                self.panicked = true;
                panic!("scanner blew up");
            }
            Ok(vec![detection(1, 2, 3, 4, 1.0)])
        }
    }

    struct SlowScanner {
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    impl ObjectScanner for SlowScanner {
        fn scan(&mut self, _image: &PixelMatrix) -> Result<Vec<Detection>, ScanError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![detection(30, 0, 40, 10, 0.5), detection(0, 0, 10, 10, 0.9)])
        }
    }

    // --- Helpers ---

    fn detection(left: i64, top: i64, right: i64, bottom: i64, score: f64) -> Detection {
        Detection {
            rect: Rectangle::new(left, top, right, bottom),
            score,
        }
    }

    fn image() -> PixelMatrix {
        PixelMatrix::from_raw(vec![0; 4 * 4 * 3], 4, 4).unwrap()
    }

    // --- Tests ---

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DetectionEngine>();
    }

    #[test]
    fn test_sorts_by_left_then_top() {
        let engine = DetectionEngine::new(Box::new(StubScanner {
            result: Ok(vec![
                detection(50, 5, 60, 15, 0.9),
                detection(10, 20, 20, 30, 0.1),
                detection(10, 5, 20, 15, 0.5),
            ]),
        }));

        assert_eq!(
            engine.detect(&image()).unwrap(),
            vec![
                Rectangle::new(10, 5, 20, 15),
                Rectangle::new(10, 20, 20, 30),
                Rectangle::new(50, 5, 60, 15),
            ]
        );
    }

    #[test]
    fn test_empty_result() {
        let engine = DetectionEngine::new(Box::new(StubScanner { result: Ok(vec![]) }));
        assert!(engine.detect(&image()).unwrap().is_empty());
    }

    #[test]
    fn test_scan_error_propagates() {
        let engine = DetectionEngine::new(Box::new(StubScanner {
            result: Err(ScanError::NonFiniteScore { level: 2 }),
        }));
        assert_eq!(
            engine.detect(&image()).unwrap_err(),
            ScanError::NonFiniteScore { level: 2 }
        );
    }

    #[test]
    fn test_recovers_after_panicked_scan() {
        let engine = DetectionEngine::new(Box::new(PanicOnceScanner { panicked: false }));

        let first = catch_unwind(AssertUnwindSafe(|| engine.detect(&image())));
        assert!(first.is_err());

        assert_eq!(
            engine.detect(&image()).unwrap(),
            vec![Rectangle::new(1, 2, 3, 4)]
        );
    }

    #[test]
    fn test_scans_never_overlap() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let engine = DetectionEngine::new(Box::new(SlowScanner {
            in_flight: in_flight.clone(),
            max_in_flight: max_in_flight.clone(),
        }));
        let img = image();

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| engine.detect(&img).unwrap()))
                .collect();
            for h in handles {
                assert_eq!(
                    h.join().unwrap(),
                    vec![Rectangle::new(0, 0, 10, 10), Rectangle::new(30, 0, 40, 10)]
                );
            }
        });

        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_model_file_missing() {
        let result = DetectionEngine::from_model_file(Path::new("/nonexistent/frontal_face.dat"));
        assert!(matches!(result, Err(ModelError::Io { .. })));
    }
}
