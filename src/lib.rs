//! kmods — 임베딩 가능한 커널 모듈 서브시스템
//!
//! 호스트(커널 또는 테스트 하네스)에 내장되어 모듈 라이프사이클을 관리한다.
//! - 모듈 선언 및 등록 (`module!` 매크로, 디스크립터 테이블)
//! - load/unload 라이프사이클 (init/exit 훅을 각각 정확히 1회 호출)
//! - 레벨 기반 로깅 + 링 버퍼 (dmesg)
//!
//! 호스트는 부팅 시 [`init`]을 호출한 뒤 `console::set_console`로 출력 싱크를
//! 연결하고, 모듈 디스크립터를 등록해 사용한다.

#![no_std]

extern crate alloc;

pub mod console;
pub mod log;
pub mod module;

/// 서브시스템 초기화
///
/// 호스트가 부팅(또는 테스트 셋업) 시 1회 호출한다. 중복 호출은 무해하다.
pub fn init() {
    log::init();
}
