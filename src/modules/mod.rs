//! Domain modules beyond the scheduler and airborne spread: detection,
//! natural history, ring destruction, trace follow-up, and list monitors.

pub mod clinical_detection;
pub mod disease_model;
pub mod list_monitor;
pub mod ring_destruction;
pub mod trace_exam;
pub mod trace_zone_focus;

pub use clinical_detection::{ClinicalDetection, ClinicalDetectionConfig};
pub use disease_model::{DiseaseModel, DiseaseModelConfig, NaturalHistoryBlock};
pub use list_monitor::{ListMonitor, MonitorKind};
pub use ring_destruction::{RingDestruction, RingDestructionConfig};
pub use trace_exam::{TraceExam, TraceExamConfig};
pub use trace_zone_focus::{TraceZoneFocus, TraceZoneFocusConfig};
