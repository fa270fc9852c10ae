// crates/funclink-cli/src/demo.rs
// ============================================================================
// Module: Demo Workflow
// Description: User validation, inventory, payment, and order composition.
// Purpose: Give the host a realistic set of callables that call each other.
// Dependencies: funclink-core, serde
// ============================================================================

//! ## Overview
//! Four business callables registered under stable component keys. The
//! leaves ([`validate_user`], [`check_inventory`], [`process_payment`]) are
//! pure functions over their payloads. [`process_order`] composes them
//! through its [`CallScope`], so each step goes through the pipeline and may
//! land on a remote endpoint when the key is not registered locally.
//!
//! Business rejections are reported in the result payloads (`valid`,
//! `available`, `success`), not as errors; only contract violations and
//! pipeline failures surface as [`InvocationError`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use funclink_core::CallScope;
use funclink_core::FunctionError;
use funclink_core::FunctionRegistration;
use funclink_core::InvocationError;
use funclink_core::ShapeTag;
use funclink_core::TypeDescriptor;
use funclink_core::time::now_unix_millis;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Component Keys
// ============================================================================

/// Key of the user validation callable.
pub const USER_VALIDATOR: &str = "userValidator";
/// Key of the inventory check callable.
pub const INVENTORY_CHECKER: &str = "inventoryChecker";
/// Key of the payment callable.
pub const PAYMENT_PROCESSOR: &str = "paymentProcessor";
/// Key of the order composition callable.
pub const ORDER_PROCESSOR: &str = "orderProcessor";

/// Minimum age accepted by [`validate_user`].
pub const MINIMUM_AGE: u32 = 18;
/// Largest quantity [`check_inventory`] can reserve.
pub const MAX_STOCK_UNITS: u32 = 100;
/// Largest amount [`process_payment`] accepts.
pub const MAX_PAYMENT_AMOUNT: f64 = 10_000.0;
/// Flat unit price used when pricing an order.
pub const UNIT_PRICE: f64 = 10.0;
/// Currency used for order payments.
pub const ORDER_CURRENCY: &str = "USD";
/// Payment method used when an order names none.
pub const DEFAULT_PAYMENT_METHOD: &str = "CARD";

// ============================================================================
// SECTION: User Validation
// ============================================================================

/// Customer identity submitted with an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    /// Display name; doubles as the payment user id.
    #[serde(default)]
    pub name: String,
    /// Contact address.
    #[serde(default)]
    pub email: String,
    /// Age in years.
    #[serde(default)]
    pub age: u32,
}

/// Outcome of [`validate_user`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the user passed every check.
    pub valid: bool,
    /// Human-readable outcome.
    pub message: String,
}

/// Accepts users with a non-blank name, an email containing `@`, and an age
/// of at least [`MINIMUM_AGE`].
#[must_use]
pub fn validate_user(user: &UserData) -> ValidationResult {
    let valid =
        !user.name.trim().is_empty() && user.email.contains('@') && user.age >= MINIMUM_AGE;
    ValidationResult {
        valid,
        message: if valid { "Valid" } else { "User data validation failed" }.to_string(),
    }
}

// ============================================================================
// SECTION: Inventory
// ============================================================================

/// Stock reservation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCheckRequest {
    /// Product identifier.
    #[serde(default)]
    pub product_id: String,
    /// Units requested.
    #[serde(default)]
    pub quantity: u32,
}

/// Outcome of [`check_inventory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryResult {
    /// Whether the request can be fulfilled.
    pub available: bool,
    /// Units reserved; zero when unavailable.
    #[serde(default)]
    pub available_quantity: u32,
    /// Human-readable outcome.
    #[serde(default)]
    pub message: String,
}

impl InventoryResult {
    /// Successful reservation of `quantity` units.
    fn available(quantity: u32) -> Self {
        Self {
            available: true,
            available_quantity: quantity,
            message: "Inventory available".to_string(),
        }
    }

    /// Rejected reservation.
    fn unavailable(message: &str) -> Self {
        Self {
            available: false,
            available_quantity: 0,
            message: message.to_string(),
        }
    }
}

/// Reserves up to [`MAX_STOCK_UNITS`] units of any named product.
#[must_use]
pub fn check_inventory(request: &InventoryCheckRequest) -> InventoryResult {
    if request.product_id.trim().is_empty() {
        return InventoryResult::unavailable("Product ID is required");
    }
    if request.quantity <= MAX_STOCK_UNITS {
        InventoryResult::available(request.quantity)
    } else {
        InventoryResult::unavailable("Insufficient inventory. Max 100 units available.")
    }
}

// ============================================================================
// SECTION: Payment
// ============================================================================

/// Charge request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Paying user.
    #[serde(default)]
    pub user_id: String,
    /// Amount to charge.
    #[serde(default)]
    pub amount: Option<f64>,
    /// ISO currency code.
    #[serde(default)]
    pub currency: String,
    /// `CARD` or `BANK_TRANSFER`.
    #[serde(default)]
    pub payment_method: String,
    /// Order the charge belongs to.
    #[serde(default)]
    pub order_id: String,
}

/// Settlement state of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Funds captured.
    Completed,
    /// Settlement in progress.
    Pending,
    /// Charge rejected.
    Failed,
}

/// Outcome of [`process_payment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    /// True only for completed payments.
    pub success: bool,
    /// Transaction reference for completed and pending payments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// Amount captured or pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_amount: Option<f64>,
    /// Human-readable outcome.
    #[serde(default)]
    pub message: String,
    /// Settlement state.
    pub status: PaymentStatus,
}

impl PaymentResult {
    /// Rejected charge.
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction_id: None,
            processed_amount: None,
            message: message.into(),
            status: PaymentStatus::Failed,
        }
    }
}

/// Charges card payments immediately and leaves bank transfers pending.
#[must_use]
pub fn process_payment(request: &PaymentRequest) -> PaymentResult {
    if request.user_id.trim().is_empty() {
        return PaymentResult::failed("User ID is required");
    }
    let amount = match request.amount {
        Some(amount) if amount > 0.0 => amount,
        _ => return PaymentResult::failed("Invalid payment amount"),
    };
    if amount > MAX_PAYMENT_AMOUNT {
        return PaymentResult::failed("Payment amount exceeds maximum limit of 10000.00");
    }
    if request.payment_method.trim().is_empty() {
        return PaymentResult::failed("Payment method is required");
    }
    let transaction_id = format!("txn-{}", now_unix_millis());
    match request.payment_method.as_str() {
        "CARD" => PaymentResult {
            success: true,
            transaction_id: Some(transaction_id),
            processed_amount: Some(amount),
            message: "Payment processed successfully".to_string(),
            status: PaymentStatus::Completed,
        },
        "BANK_TRANSFER" => PaymentResult {
            success: false,
            transaction_id: Some(transaction_id),
            processed_amount: Some(amount),
            message: "Payment is being processed".to_string(),
            status: PaymentStatus::Pending,
        },
        other => PaymentResult::failed(format!("Unsupported payment method: {other}")),
    }
}

// ============================================================================
// SECTION: Orders
// ============================================================================

/// Order submitted by a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Customer placing the order.
    #[serde(default)]
    pub user_data: UserData,
    /// Product ordered.
    #[serde(default)]
    pub product_id: String,
    /// Units ordered.
    #[serde(default)]
    pub quantity: u32,
    /// Payment method; [`DEFAULT_PAYMENT_METHOD`] when absent.
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// Outcome of [`process_order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResult {
    /// Whether the order was created.
    pub success: bool,
    /// Identifier of the created order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Payment transaction backing the order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// Human-readable outcome.
    pub message: String,
}

impl OrderResult {
    /// Order rejected at some step.
    fn failed(message: String) -> Self {
        Self {
            success: false,
            order_id: None,
            transaction_id: None,
            message,
        }
    }
}

/// Validates the user, reserves stock, then charges the order total.
///
/// Each step is a nested pipeline call, so the order records one dependency
/// edge per step that ran. The first rejected step ends the order.
///
/// # Errors
///
/// Returns [`InvocationError`] when a nested call fails outright (lookup,
/// access, conversion, or remote failure).
pub fn process_order(
    scope: &CallScope<'_>,
    request: CreateOrderRequest,
) -> Result<OrderResult, InvocationError> {
    let validation: ValidationResult = scope.invoke_typed(USER_VALIDATOR, &request.user_data)?;
    if !validation.valid {
        return Ok(OrderResult::failed(format!("User validation failed: {}", validation.message)));
    }

    let inventory: InventoryResult = scope.invoke_typed(
        INVENTORY_CHECKER,
        &InventoryCheckRequest {
            product_id: request.product_id.clone(),
            quantity: request.quantity,
        },
    )?;
    if !inventory.available {
        return Ok(OrderResult::failed(format!("Inventory check failed: {}", inventory.message)));
    }

    let payment: PaymentResult = scope.invoke_typed(
        PAYMENT_PROCESSOR,
        &PaymentRequest {
            user_id: request.user_data.name.clone(),
            amount: Some(order_total(request.quantity)),
            currency: ORDER_CURRENCY.to_string(),
            payment_method: request
                .payment_method
                .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
            order_id: "temp-order-id".to_string(),
        },
    )?;
    if !payment.success {
        return Ok(OrderResult::failed(format!("Payment processing failed: {}", payment.message)));
    }

    Ok(OrderResult {
        success: true,
        order_id: Some(format!("order-{}", now_unix_millis())),
        transaction_id: payment.transaction_id,
        message: "Order created successfully".to_string(),
    })
}

/// Prices `quantity` units at [`UNIT_PRICE`].
fn order_total(quantity: u32) -> f64 {
    f64::from(quantity) * UNIT_PRICE
}

// ============================================================================
// SECTION: Registrations
// ============================================================================

/// Object-shaped descriptor for a payload type.
fn object_type<T>() -> TypeDescriptor {
    TypeDescriptor::of::<T>().with_shape(ShapeTag::Object)
}

/// Returns every demo callable, keyed and typed.
#[must_use]
pub fn registrations() -> Vec<FunctionRegistration> {
    vec![
        FunctionRegistration::typed(USER_VALIDATOR, |user: UserData| {
            Ok::<_, FunctionError>(validate_user(&user))
        })
        .named("User Validator")
        .input_type(object_type::<UserData>())
        .output_type(object_type::<ValidationResult>()),
        FunctionRegistration::typed(INVENTORY_CHECKER, |request: InventoryCheckRequest| {
            Ok::<_, FunctionError>(check_inventory(&request))
        })
        .named("Inventory Checker")
        .input_type(object_type::<InventoryCheckRequest>())
        .output_type(object_type::<InventoryResult>()),
        FunctionRegistration::typed(PAYMENT_PROCESSOR, |request: PaymentRequest| {
            Ok::<_, FunctionError>(process_payment(&request))
        })
        .named("Payment Processor")
        .input_type(object_type::<PaymentRequest>())
        .output_type(object_type::<PaymentResult>()),
        FunctionRegistration::composite(ORDER_PROCESSOR, process_order)
            .named("Order Processor")
            .input_type(object_type::<CreateOrderRequest>())
            .output_type(object_type::<OrderResult>()),
    ]
}
