use criterion::{Criterion, criterion_group, criterion_main};
use domain::FlowState;
use intent::{IntentClassifier, IntentContext, NormalizedText};
use std::hint::black_box;

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("intent/normalize", |b| {
        b.iter(|| NormalizedText::new(black_box("  Cho mình ĐẶT HÀNG cái áo này nhé!!  ")));
    });
}

fn bench_order_request(c: &mut Criterion) {
    let classifier = IntentClassifier::new();
    let ctx = IntentContext::for_state(FlowState::Idle, true);

    c.bench_function("intent/classify_order_request", |b| {
        b.iter(|| classifier.classify(black_box("mình muốn đặt hàng luôn"), &ctx));
    });
}

fn bench_unmatched(c: &mut Criterion) {
    let classifier = IntentClassifier::new();
    let ctx = IntentContext::for_state(FlowState::Idle, true);

    // Falls through every rule.
    c.bench_function("intent/classify_unmatched", |b| {
        b.iter(|| {
            classifier.classify(
                black_box("shop ơi áo sơ mi trắng còn size M không, giá bao nhiêu vậy"),
                &ctx,
            )
        });
    });
}

fn bench_flow_specific(c: &mut Criterion) {
    let classifier = IntentClassifier::new();
    let ctx = IntentContext::for_state(FlowState::PaymentSelection, true);

    c.bench_function("intent/classify_payment_selection", |b| {
        b.iter(|| classifier.classify(black_box("thanh toán khi nhận hàng"), &ctx));
    });
}

criterion_group!(
    benches,
    bench_normalize,
    bench_order_request,
    bench_unmatched,
    bench_flow_specific
);
criterion_main!(benches);
