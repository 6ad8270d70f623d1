//! Proyección del ciclo de vida de una reserva
//!
//! A partir del estado autoritativo de la reserva y de los registros
//! relacionados (documentos, pagos, contrato, walkaround, preparación, fotos)
//! calcula el checklist de operaciones, el paso actual y qué transiciones se
//! pueden ofrecer. Es una función pura: no escribe nada y no guarda memoria
//! entre evaluaciones. Los datos que todavía no se han cargado (`None`) cuentan
//! como incompletos.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

use crate::models::{
    agreement::AgreementStatus,
    booking::{Booking, BookingStatus},
    inspection::WalkaroundInspection,
    payment::{DepositStatus, PaymentStatus},
    return_record::ReturnStage,
    verification::{DocumentType, VerificationDocument, VerificationStatus},
};

/// Paso del checklist de operaciones, en orden fijo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationsStep {
    Intake,
    Prep,
    CheckIn,
    Payment,
    Agreement,
    Walkaround,
    Handover,
}

impl OperationsStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationsStep::Intake => "intake",
            OperationsStep::Prep => "prep",
            OperationsStep::CheckIn => "check_in",
            OperationsStep::Payment => "payment",
            OperationsStep::Agreement => "agreement",
            OperationsStep::Walkaround => "walkaround",
            OperationsStep::Handover => "handover",
        }
    }
}

impl fmt::Display for OperationsStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-condición booleana de un paso
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    VehicleAssigned,
    LicenseUploaded,
    LicenseApproved,
    VehiclePrepComplete,
    ConditionPhotosComplete,
    PaymentCompleted,
    AgreementSigned,
    InspectionComplete,
    CustomerAcknowledged,
    WalkaroundComplete,
}

impl Condition {
    /// Texto mostrado al usuario cuando la condición no se cumple
    pub fn unmet_reason(&self) -> &'static str {
        match self {
            Condition::VehicleAssigned => "no vehicle has been assigned to the booking",
            Condition::LicenseUploaded => {
                "the driver license front and back have not both been uploaded, or one was rejected"
            }
            Condition::LicenseApproved => "the driver license front and back have not both been verified",
            Condition::VehiclePrepComplete => "the vehicle prep checklist is not complete",
            Condition::ConditionPhotosComplete => "the vehicle condition photos are not complete",
            Condition::PaymentCompleted => "no completed payment has been recorded",
            Condition::AgreementSigned => "the rental agreement has not been signed",
            Condition::InspectionComplete => "the walkaround inspection has not been performed",
            Condition::CustomerAcknowledged => "the customer has not acknowledged the walkaround inspection",
            Condition::WalkaroundComplete => "the walkaround inspection is not complete",
        }
    }

    fn evaluate(&self, input: &ProjectionInput) -> bool {
        match self {
            Condition::VehicleAssigned => input.vehicle_id.is_some(),
            Condition::LicenseUploaded => license_uploaded(input.verification_documents.as_deref()),
            Condition::LicenseApproved => license_approved(input.verification_documents.as_deref()),
            Condition::VehiclePrepComplete => input.vehicle_prep_complete.unwrap_or(false),
            Condition::ConditionPhotosComplete => input.condition_photos_complete.unwrap_or(false),
            Condition::PaymentCompleted => input
                .payment_statuses
                .as_deref()
                .map_or(false, |statuses| statuses.contains(&PaymentStatus::Completed)),
            Condition::AgreementSigned => input.agreement_status.map_or(false, |s| s.is_signed()),
            Condition::InspectionComplete => input.walkaround.map_or(false, |w| w.inspection_complete),
            Condition::CustomerAcknowledged => input.walkaround.map_or(false, |w| w.customer_acknowledged),
            Condition::WalkaroundComplete => input.walkaround.map_or(false, |w| w.is_complete()),
        }
    }
}

struct StepDefinition {
    step: OperationsStep,
    conditions: &'static [Condition],
}

const STEPS: [StepDefinition; 7] = [
    StepDefinition {
        step: OperationsStep::Intake,
        conditions: &[
            Condition::VehicleAssigned,
            Condition::LicenseUploaded,
            Condition::LicenseApproved,
        ],
    },
    StepDefinition {
        step: OperationsStep::Prep,
        conditions: &[Condition::VehiclePrepComplete],
    },
    StepDefinition {
        step: OperationsStep::CheckIn,
        conditions: &[Condition::ConditionPhotosComplete],
    },
    StepDefinition {
        step: OperationsStep::Payment,
        conditions: &[Condition::PaymentCompleted],
    },
    StepDefinition {
        step: OperationsStep::Agreement,
        conditions: &[Condition::AgreementSigned],
    },
    StepDefinition {
        step: OperationsStep::Walkaround,
        conditions: &[Condition::InspectionComplete, Condition::CustomerAcknowledged],
    },
    StepDefinition {
        step: OperationsStep::Handover,
        conditions: &[Condition::WalkaroundComplete],
    },
];

/// Pasos que deben estar completos para activar el alquiler, en orden del checklist
const ACTIVATION_STEPS: [OperationsStep; 3] = [
    OperationsStep::Payment,
    OperationsStep::Agreement,
    OperationsStep::Walkaround,
];

/// Documento de verificación reducido a lo que lee la proyección
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentReview {
    pub document_type: DocumentType,
    pub status: VerificationStatus,
}

impl From<&VerificationDocument> for DocumentReview {
    fn from(document: &VerificationDocument) -> Self {
        Self {
            document_type: document.document_type,
            status: document.status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkaroundFlags {
    pub inspection_complete: bool,
    pub customer_acknowledged: bool,
}

impl WalkaroundFlags {
    pub fn is_complete(&self) -> bool {
        self.inspection_complete && self.customer_acknowledged
    }
}

impl From<&WalkaroundInspection> for WalkaroundFlags {
    fn from(inspection: &WalkaroundInspection) -> Self {
        Self {
            inspection_complete: inspection.inspection_complete,
            customer_acknowledged: inspection.customer_acknowledged,
        }
    }
}

/// Entradas de la proyección. `None` significa "todavía no cargado".
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInput {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub vehicle_id: Option<Uuid>,
    pub verification_documents: Option<Vec<DocumentReview>>,
    pub payment_statuses: Option<Vec<PaymentStatus>>,
    pub deposit_status: Option<DepositStatus>,
    pub agreement_status: Option<AgreementStatus>,
    pub walkaround: Option<WalkaroundFlags>,
    pub vehicle_prep_complete: Option<bool>,
    pub condition_photos_complete: Option<bool>,
    pub return_stage: Option<ReturnStage>,
}

impl ProjectionInput {
    /// Entrada con solo la reserva cargada; el resto queda pendiente
    pub fn for_booking(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            status: booking.status,
            vehicle_id: booking.vehicle_id,
            verification_documents: None,
            payment_statuses: None,
            deposit_status: None,
            agreement_status: None,
            walkaround: None,
            vehicle_prep_complete: None,
            condition_photos_complete: None,
            return_stage: None,
        }
    }
}

fn documents_of(docs: &[DocumentReview], kind: DocumentType) -> impl Iterator<Item = &DocumentReview> {
    docs.iter().filter(move |d| d.document_type == kind)
}

const LICENSE_SIDES: [DocumentType; 2] = [DocumentType::LicenseFront, DocumentType::LicenseBack];

fn license_uploaded(docs: Option<&[DocumentReview]>) -> bool {
    let Some(docs) = docs else { return false };
    LICENSE_SIDES.iter().all(|side| {
        let mut side_docs = documents_of(docs, *side).peekable();
        side_docs.peek().is_some() && side_docs.all(|d| d.status != VerificationStatus::Rejected)
    })
}

fn license_approved(docs: Option<&[DocumentReview]>) -> bool {
    let Some(docs) = docs else { return false };
    LICENSE_SIDES.iter().all(|side| {
        let mut side_docs = documents_of(docs, *side).peekable();
        side_docs.peek().is_some() && side_docs.all(|d| d.status == VerificationStatus::Verified)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConditionState {
    pub condition: Condition,
    pub met: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepState {
    pub step: OperationsStep,
    pub complete: bool,
    pub conditions: Vec<ConditionState>,
}

impl StepState {
    fn first_unmet(&self) -> Option<Condition> {
        self.conditions.iter().find(|c| !c.met).map(|c| c.condition)
    }
}

/// Acción que la UI puede ofrecer sobre la reserva
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedAction {
    Activate,
    Cancel,
    Advance,
}

impl fmt::Display for GatedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GatedAction::Activate => "activate",
            GatedAction::Cancel => "cancel",
            GatedAction::Advance => "advance",
        })
    }
}

/// Motivo concreto por el que una acción no está permitida
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    StatusNotAllowed {
        action: GatedAction,
        status: BookingStatus,
    },
    StepIncomplete {
        step: OperationsStep,
        condition: Condition,
    },
    ReturnNotSettled {
        stage: ReturnStage,
    },
}

impl Denial {
    /// Las denegaciones por checklist se resuelven completando el paso; las de
    /// estado no tienen arreglo para esta reserva.
    pub fn is_precondition(&self) -> bool {
        !matches!(self, Denial::StatusNotAllowed { .. })
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denial::StatusNotAllowed { action, status } => match (action, status) {
                (GatedAction::Activate, BookingStatus::Pending) => {
                    write!(f, "the booking must be confirmed before it can be activated")
                }
                (GatedAction::Cancel, _) => write!(
                    f,
                    "booking is {} and cannot be cancelled; only pending or confirmed bookings can",
                    status
                ),
                (GatedAction::Advance, _) => {
                    write!(f, "booking is {} and has no further status to advance to", status)
                }
                (GatedAction::Activate, _) => write!(f, "booking is {} and cannot be activated", status),
            },
            Denial::StepIncomplete { step, condition } => {
                write!(f, "{} step incomplete: {}", step, condition.unmet_reason())
            }
            Denial::ReturnNotSettled { stage } => write!(
                f,
                "the vehicle return is not settled yet (stage {}, {}%)",
                stage.as_str(),
                stage.progress_percent()
            ),
        }
    }
}

/// Resultado de evaluar una acción
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Permitted,
    Denied(Denial),
}

impl Gate {
    pub fn is_permitted(&self) -> bool {
        matches!(self, Gate::Permitted)
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Gate::Permitted => None,
            Gate::Denied(denial) => Some(denial),
        }
    }
}

impl Serialize for Gate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Gate", 2)?;
        state.serialize_field("allowed", &self.is_permitted())?;
        state.serialize_field("reason", &self.denial().map(|d| d.to_string()))?;
        state.end()
    }
}

/// Vista derivada del ciclo de vida
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleProjection {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub steps: Vec<StepState>,
    pub current_step: OperationsStep,
    pub current_step_index: usize,
    pub all_steps_complete: bool,
    /// El estado autoritativo ya superó lo que indica el checklist; el
    /// checklist queda solo como registro administrativo.
    pub status_ahead_of_checklist: bool,
    pub deposit_held: bool,
    pub return_stage: ReturnStage,
    pub return_progress_percent: u8,
    pub can_activate: Gate,
    pub can_cancel: Gate,
    pub can_advance: Gate,
}

impl LifecycleProjection {
    pub fn step(&self, step: OperationsStep) -> Option<&StepState> {
        self.steps.iter().find(|s| s.step == step)
    }

    pub fn is_complete(&self, step: OperationsStep) -> bool {
        self.step(step).map_or(false, |s| s.complete)
    }

    pub fn gate(&self, action: GatedAction) -> &Gate {
        match action {
            GatedAction::Activate => &self.can_activate,
            GatedAction::Cancel => &self.can_cancel,
            GatedAction::Advance => &self.can_advance,
        }
    }

    /// Gate que protege la transición hacia `target` desde el estado actual
    pub fn gate_for_transition(&self, target: BookingStatus) -> Gate {
        match (self.status, target) {
            (_, BookingStatus::Cancelled) => self.can_cancel.clone(),
            (_, BookingStatus::Active) => self.can_activate.clone(),
            (current, target) if current.next() == Some(target) => self.can_advance.clone(),
            (current, _) => Gate::Denied(Denial::StatusNotAllowed {
                action: GatedAction::Advance,
                status: current,
            }),
        }
    }
}

fn evaluate_steps(input: &ProjectionInput) -> Vec<StepState> {
    STEPS
        .iter()
        .map(|definition| {
            let conditions: Vec<ConditionState> = definition
                .conditions
                .iter()
                .map(|condition| ConditionState {
                    condition: *condition,
                    met: condition.evaluate(input),
                })
                .collect();
            StepState {
                step: definition.step,
                complete: conditions.iter().all(|c| c.met),
                conditions,
            }
        })
        .collect()
}

fn activation_gate(status: BookingStatus, steps: &[StepState]) -> Gate {
    if !status.is_cancellable() {
        return Gate::Denied(Denial::StatusNotAllowed {
            action: GatedAction::Activate,
            status,
        });
    }

    for required in ACTIVATION_STEPS {
        let unmet = steps
            .iter()
            .find(|s| s.step == required)
            .and_then(StepState::first_unmet);
        if let Some(condition) = unmet {
            return Gate::Denied(Denial::StepIncomplete {
                step: required,
                condition,
            });
        }
    }

    if status == BookingStatus::Pending {
        return Gate::Denied(Denial::StatusNotAllowed {
            action: GatedAction::Activate,
            status,
        });
    }

    Gate::Permitted
}

fn cancel_gate(status: BookingStatus) -> Gate {
    if status.is_cancellable() {
        Gate::Permitted
    } else {
        Gate::Denied(Denial::StatusNotAllowed {
            action: GatedAction::Cancel,
            status,
        })
    }
}

fn advance_gate(status: BookingStatus, activate: &Gate, return_stage: ReturnStage) -> Gate {
    if status.is_terminal() {
        return Gate::Denied(Denial::StatusNotAllowed {
            action: GatedAction::Advance,
            status,
        });
    }

    match status {
        BookingStatus::Pending => Gate::Permitted,
        BookingStatus::Confirmed => activate.clone(),
        _ if return_stage.is_settled() => Gate::Permitted,
        _ => Gate::Denied(Denial::ReturnNotSettled { stage: return_stage }),
    }
}

/// Calcular la proyección completa a partir de las entradas
pub fn project(input: &ProjectionInput) -> LifecycleProjection {
    let steps = evaluate_steps(input);

    let first_incomplete = steps.iter().position(|s| !s.complete);
    let all_steps_complete = first_incomplete.is_none();
    let current_step_index = first_incomplete.unwrap_or(steps.len() - 1);
    let current_step = steps[current_step_index].step;

    let return_stage = input.return_stage.unwrap_or(ReturnStage::NotStarted);
    let can_activate = activation_gate(input.status, &steps);
    let can_cancel = cancel_gate(input.status);
    let can_advance = advance_gate(input.status, &can_activate, return_stage);

    let status_ahead_of_checklist = matches!(input.status, BookingStatus::Active | BookingStatus::Completed)
        && !all_steps_complete;

    LifecycleProjection {
        booking_id: input.booking_id,
        status: input.status,
        steps,
        current_step,
        current_step_index,
        all_steps_complete,
        status_ahead_of_checklist,
        deposit_held: input.deposit_status == Some(DepositStatus::Held),
        return_stage,
        return_progress_percent: return_stage.progress_percent(),
        can_activate,
        can_cancel,
        can_advance,
    }
}
