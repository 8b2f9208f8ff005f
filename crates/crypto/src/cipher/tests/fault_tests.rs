// Copyright (C) Microsoft Corporation. All rights reserved.

use std::sync::Arc;

use test_with_tracing::test;

use super::*;

type FaultyContext = StreamCipherContext<FaultInjectingProvider<OsslCipherProvider>>;

fn faulty(mode: CipherMode, plan: &Arc<FaultPlan>) -> FaultyContext {
    let provider = FaultInjectingProvider::new(OsslCipherProvider, Arc::clone(plan));
    StreamCipherContext::new(provider, CipherFamily::Aes128, mode, Padding::Pkcs7)
}

fn init(ctx: &mut FaultyContext, direction: Direction) -> Result<(), CryptoError> {
    let iv: &[u8] = match ctx.mode() {
        CipherMode::Gcm => &[3; 12],
        _ => &[3; 16],
    };
    ctx.init(direction, &test_key(16), Some(iv), 16)
}

#[test]
fn select_and_init_faults_leave_context_unconfigured() {
    let plan = FaultPlan::new();
    let mut ctx = faulty(CipherMode::Cbc, &plan);

    plan.arm(FaultPoint::Select);
    assert_eq!(init(&mut ctx, Direction::Encrypt), Err(CryptoError::OpensslError));
    assert!(!ctx.is_initialized());

    plan.clear();
    plan.arm(FaultPoint::Init);
    assert_eq!(init(&mut ctx, Direction::Encrypt), Err(CryptoError::OpensslError));
    assert!(!ctx.is_initialized());

    plan.clear();
    assert_eq!(init(&mut ctx, Direction::Encrypt), Ok(()));
}

#[test]
fn update_fault_leaves_stream_untouched() {
    let plan = FaultPlan::new();
    let mut ctx = faulty(CipherMode::Ctr, &plan);
    init(&mut ctx, Direction::Encrypt).expect("init");

    plan.arm(FaultPoint::Update);
    let mut out = [0u8; 40];
    assert_eq!(ctx.update(&[1u8; 40], &mut out), Err(CryptoError::OpensslError));
    assert_eq!(ctx.processed(), Some(0));
    assert_eq!(ctx.counter().map(Counter128::magnitude), Some((0, 0)));

    plan.clear();
    assert_eq!(ctx.update(&[1u8; 8], &mut out), Ok(8));
    assert_eq!(ctx.counter().map(Counter128::magnitude), Some((0, 1)));
}

#[test]
fn aad_fault_does_not_count_input() {
    let plan = FaultPlan::new();
    let mut ctx = faulty(CipherMode::Gcm, &plan);
    init(&mut ctx, Direction::Encrypt).expect("init");

    plan.arm(FaultPoint::Aad);
    assert_eq!(ctx.update_aad(&[1u8; 8]), Err(CryptoError::OpensslError));
    assert_eq!(ctx.processed(), Some(0));

    plan.clear();
    assert_eq!(ctx.update_aad(&[1u8; 8]), Ok(0));
    assert_eq!(ctx.processed(), Some(8));
}

#[test]
fn staged_update_fault_keeps_the_tag_stage() {
    let plan = FaultPlan::new();
    let plaintext = test_plaintext(45);

    let mut enc = faulty(CipherMode::Gcm, &plan);
    init(&mut enc, Direction::Encrypt).expect("init");
    let sealed = drive(&mut enc, &[], &plaintext, 64).expect("encrypt");

    let mut dec = faulty(CipherMode::Gcm, &plan);
    init(&mut dec, Direction::Decrypt).expect("init");

    plan.arm(FaultPoint::Update);
    let mut out = [0u8; 64];
    assert_eq!(dec.update(&sealed[..20], &mut out), Err(CryptoError::OpensslError));
    assert_eq!(dec.processed(), Some(0));

    // A retry of the whole stream must not see the bytes of the failed call.
    plan.clear();
    assert_eq!(drive(&mut dec, &[], &sealed, 7), Ok(plaintext));
}

#[test]
fn decrypt_final_fault_reports_by_mode_and_rearms() {
    let plan = FaultPlan::new();

    let mut gcm = faulty(CipherMode::Gcm, &plan);
    init(&mut gcm, Direction::Decrypt).expect("init");
    assert_eq!(gcm.update(&[0u8; 20], &mut [0u8; 20]), Ok(4));
    plan.arm(FaultPoint::Final);
    assert_eq!(gcm.finalize(&mut []), Err(CryptoError::TagInvalid));
    assert!(gcm.is_initialized());
    assert_eq!(gcm.processed(), Some(0));

    let mut cbc = faulty(CipherMode::Cbc, &plan);
    init(&mut cbc, Direction::Decrypt).expect("init");
    assert_eq!(cbc.update(&[0u8; 16], &mut [0u8; 16]), Ok(0));
    assert_eq!(
        cbc.finalize(&mut [0u8; 16]),
        Err(CryptoError::InvalidCipherText)
    );
    assert!(cbc.is_initialized());
}

#[test]
fn tag_faults() {
    let plan = FaultPlan::new();

    let mut enc = faulty(CipherMode::Gcm, &plan);
    init(&mut enc, Direction::Encrypt).expect("init");
    plan.arm(FaultPoint::GetTag);
    assert_eq!(
        enc.finalize(&mut [0u8; 16]),
        Err(CryptoError::OpensslError)
    );
    assert!(enc.is_initialized());

    plan.clear();
    plan.arm(FaultPoint::SetTag);
    let mut dec = faulty(CipherMode::Gcm, &plan);
    init(&mut dec, Direction::Decrypt).expect("init");
    assert_eq!(dec.update(&[0u8; 16], &mut []), Ok(0));
    assert_eq!(dec.finalize(&mut []), Err(CryptoError::OpensslError));
    assert_eq!(dec.set_tag(&[0u8; 16]), Err(CryptoError::OpensslError));
}

#[test]
fn failed_rearm_leaves_context_unconfigured() {
    let plan = FaultPlan::new();
    let mut ctx = faulty(CipherMode::Ofb, &plan);
    init(&mut ctx, Direction::Encrypt).expect("init");
    assert_eq!(ctx.update(b"abc", &mut [0u8; 3]), Ok(3));

    plan.arm(FaultPoint::Init);
    // The stream itself finished fine; only the re-arm failed.
    assert_eq!(ctx.finalize(&mut []), Ok(0));
    assert!(!ctx.is_initialized());
    assert_eq!(ctx.update(b"abc", &mut [0u8; 3]), Err(CryptoError::NotInitialized));

    plan.disarm(FaultPoint::Init);
    assert_eq!(init(&mut ctx, Direction::Encrypt), Ok(()));
    assert_eq!(ctx.provider().version(), OsslCipherProvider.version());
}
