//! Opaque id types for every entity in spec §3.

common_utils::opaque_id!(SessionId, "sess", "Identifies a `CheckoutSession`.");
common_utils::opaque_id!(MandateId, "mandate", "Identifies a `PaymentMandate`.");
common_utils::opaque_id!(ChallengeId, "chal", "Identifies a `StepUpChallenge`.");
common_utils::opaque_id!(ReceiptId, "rcpt", "Identifies a `PaymentReceipt`.");
common_utils::opaque_id!(PaymentId, "pay", "Identifies a single payment attempt.");
common_utils::opaque_id!(
    DeviceCredentialId,
    "cred",
    "Identifies a registered `DeviceCredential`."
);
common_utils::opaque_id!(
    InstrumentId,
    "instr",
    "Identifies a `PaymentInstrument` on file."
);
common_utils::opaque_id!(RequestLogId, "reqlog", "Identifies a `RequestLogEntry`.");
