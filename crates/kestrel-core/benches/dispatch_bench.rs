// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kestrel_core::event::{EventRouter, MouseButtonEvent, MouseMotionEvent};

fn motion(x: f32) -> MouseMotionEvent {
    MouseMotionEvent {
        timestamp: 0,
        window_id: 1,
        device_id: 0,
        x,
        y: 0.0,
        dx: 1.0,
        dy: 0.0,
        button_mask: 0,
    }
}

fn bench_dispatch(c: &mut Criterion) {
    let mut router = EventRouter::new();

    // Half the handlers accept motion, the other half only narrow and skip.
    for _ in 0..16 {
        router.on(|event: &MouseMotionEvent| {
            black_box(event.x);
            Ok(())
        });
        router.on(|event: &MouseButtonEvent| {
            black_box(event.button);
            Ok(())
        });
    }

    let mut group = c.benchmark_group("Event Dispatch");

    group.bench_function("Route motion through 32 handlers", |b| {
        b.iter(|| {
            router
                .route(Box::new(motion(black_box(1.0))))
                .expect("routing should not fail");
        });
    });

    group.finish();
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
