#![forbid(unsafe_code)]

//! Compiled-in fallback descriptor.
//!
//! When no on-disk descriptor can be found or parsed, the database
//! degrades to this xterm-family entry instead of failing: decoding and
//! rendering must never be impossible purely for lack of a descriptor
//! file. The entry is stored in text form and parsed by the same code
//! path as external text databases.
//!
//! The capability values mirror the stock `xterm-256color` entry,
//! trimmed to what this core consumes.

use crate::db::{Database, Source};

pub(crate) const FALLBACK_NAME: &str = "xterm-256color";

const FALLBACK_SOURCE: &str = "\
xterm-256color|built-in fallback xterm with 256 colors,
\tam, km, mir, msgr, xenl,
\tcols#80, lines#24, it#8, colors#256, pairs#65536,
\tbel=^G, cr=\\r, cud1=\\n, ind=\\n, ri=\\EM,
\tclear=\\E[H\\E[2J, el=\\E[K, ed=\\E[J, ech=\\E[%p1%dX,
\thome=\\E[H, cup=\\E[%i%p1%d;%p2%dH, hpa=\\E[%i%p1%dG, vpa=\\E[%i%p1%dd,
\tcub1=^H, cuf1=\\E[C, cuu1=\\E[A,
\tcub=\\E[%p1%dD, cuf=\\E[%p1%dC, cuu=\\E[%p1%dA, cud=\\E[%p1%dB,
\tcivis=\\E[?25l, cnorm=\\E[?12l\\E[?25h, cvvis=\\E[?12;25h,
\tsmcup=\\E[?1049h\\E[22;0;0t, rmcup=\\E[?1049l\\E[23;0;0t,
\tsmkx=\\E[?1h\\E=, rmkx=\\E[?1l\\E>,
\tbold=\\E[1m, dim=\\E[2m, smul=\\E[4m, blink=\\E[5m, rev=\\E[7m,
\tinvis=\\E[8m, smso=\\E[7m, rmso=\\E[27m, rmul=\\E[24m,
\tsgr0=\\E(B\\E[m, op=\\E[39;49m,
\tsetaf=\\E[%?%p1%{8}%<%t3%p1%d%e%p1%{16}%<%t9%p1%{8}%-%d%e38;5;%p1%d%;m,
\tsetab=\\E[%?%p1%{8}%<%t4%p1%d%e%p1%{16}%<%t10%p1%{8}%-%d%e48;5;%p1%d%;m,
\tcsr=\\E[%i%p1%d;%p2%dr, rep=%p1%c\\E[%p2%{1}%-%db,
\tkbs=^?, kcbt=\\E[Z, kent=\\EOM,
\tkcuu1=\\EOA, kcud1=\\EOB, kcuf1=\\EOC, kcub1=\\EOD,
\tkhome=\\EOH, kend=\\EOF, knp=\\E[6~, kpp=\\E[5~,
\tkich1=\\E[2~, kdch1=\\E[3~, kmous=\\E[M,
\tkf1=\\EOP, kf2=\\EOQ, kf3=\\EOR, kf4=\\EOS,
\tkf5=\\E[15~, kf6=\\E[17~, kf7=\\E[18~, kf8=\\E[19~,
\tkf9=\\E[20~, kf10=\\E[21~, kf11=\\E[23~, kf12=\\E[24~,
";

/// Build the fallback table. Infallible: the source is a compile-time
/// constant exercised by tests.
pub(crate) fn fallback() -> Database {
    match Database::load(FALLBACK_NAME, Source::Text(FALLBACK_SOURCE)) {
        Ok(db) => db,
        Err(err) => unreachable!("built-in descriptor must parse: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::{BoolCap, NumCap, StrCap};

    #[test]
    fn fallback_parses() {
        let db = fallback();
        assert_eq!(db.names()[0], "xterm-256color");
        assert!(db.flag(BoolCap::AutoRightMargin));
        assert!(db.flag(BoolCap::EatNewlineGlitch));
        assert_eq!(db.num(NumCap::MaxColors), Some(256));
        assert_eq!(db.num(NumCap::Lines), Some(24));
    }

    #[test]
    fn fallback_rendering_caps_compile() {
        let db = fallback();
        for cap in [
            StrCap::CursorAddress,
            StrCap::ExitAttributeMode,
            StrCap::SetAForeground,
            StrCap::SetABackground,
            StrCap::ClrEol,
            StrCap::EnterBoldMode,
            StrCap::ChangeScrollRegion,
        ] {
            assert!(db.compile(cap).is_ok(), "{} must compile", cap.short_name());
        }
    }

    #[test]
    fn fallback_colors_use_sgr_ranges() {
        let db = fallback();
        let setaf = db.compile(StrCap::SetAForeground).unwrap();
        assert_eq!(setaf.call(&[2]), b"\x1b[32m");
        assert_eq!(setaf.call(&[10]), b"\x1b[92m");
        assert_eq!(setaf.call(&[42]), b"\x1b[38;5;42m");
        let setab = db.compile(StrCap::SetABackground).unwrap();
        assert_eq!(setab.call(&[2]), b"\x1b[42m");
        assert_eq!(setab.call(&[42]), b"\x1b[48;5;42m");
    }

    #[test]
    fn fallback_function_keys_present() {
        let db = fallback();
        assert_eq!(db.raw_str(StrCap::KeyF1), Some(&b"\x1bOP"[..]));
        assert_eq!(db.raw_str(StrCap::KeyF5), Some(&b"\x1b[15~"[..]));
        assert_eq!(db.raw_str(StrCap::KeyUp), Some(&b"\x1bOA"[..]));
        assert_eq!(db.raw_str(StrCap::KeyMouse), Some(&b"\x1b[M"[..]));
    }
}
