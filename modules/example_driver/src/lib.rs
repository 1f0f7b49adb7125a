//! 예제 드라이버 모듈
//!
//! 모듈 시스템의 최소 스켈레톤. load/unload 시 로그 한 줄씩 남기는 것이
//! 전부이며 디바이스 로직은 없다.

#![no_std]

use kmods::log_info;

kmods::module! {
    name: "example_driver",
    version: "0.1.0",
    license: "GPL",
    author: "kmods developers",
    description: "A simple example driver module.",
    init: module_init,
    exit: module_exit,
}

/// 모듈 초기화 함수
///
/// 실패 경로가 없다 — 항상 0(성공)을 반환한다.
#[unsafe(no_mangle)]
pub extern "C" fn module_init() -> i32 {
    log_info!("Example driver loaded.");
    0
}

/// 모듈 정리 함수
#[unsafe(no_mangle)]
pub extern "C" fn module_exit() {
    log_info!("Example driver unloaded.");
}
