// Copyright (c) Contributors to the cenv project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `cenv env hook` command.
//!
//! Prints a shell-specific snippet that runs `cenv env load` on each prompt
//! and applies the emitted SET/DEL token stream to the live shell.

use clap::{Args, ValueEnum};
use miette::Result;

/// Print the hook script for a shell
#[derive(Debug, Args)]
pub struct CmdHook {
    /// Shell to generate the hook for
    #[clap(value_enum)]
    pub shell: Shell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl CmdHook {
    pub fn run(&self) -> Result<i32> {
        print!("{}", self.shell.script());
        Ok(0)
    }
}

impl Shell {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
            Shell::Fish => "fish",
            Shell::Powershell => "powershell",
        }
    }

    /// The hook snippet for this shell, meant for `eval`/`source` from the
    /// shell's startup file.
    pub fn script(&self) -> &'static str {
        match self {
            Shell::Bash => BASH_HOOK,
            Shell::Zsh => ZSH_HOOK,
            Shell::Fish => FISH_HOOK,
            Shell::Powershell => POWERSHELL_HOOK,
        }
    }
}

impl std::fmt::Display for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const BASH_HOOK: &str = r#"_cenv_apply() {
  local op key value
  while IFS= read -r op; do
    case "$op" in
      SET)
        IFS= read -r key
        IFS= read -r value
        export "$key=$value"
        ;;
      DEL)
        IFS= read -r key
        unset "$key"
        ;;
    esac
  done
}

_cenv_hook() {
  local diff
  diff="$(cenv env load)" || return 0
  [ -n "$diff" ] && _cenv_apply <<< "$diff"
  return 0
}

if [[ ";${PROMPT_COMMAND:-};" != *";_cenv_hook;"* ]]; then
  PROMPT_COMMAND="_cenv_hook${PROMPT_COMMAND:+;$PROMPT_COMMAND}"
fi
"#;

const ZSH_HOOK: &str = r#"_cenv_apply() {
  local op key value
  while IFS= read -r op; do
    case "$op" in
      SET)
        IFS= read -r key
        IFS= read -r value
        export "$key=$value"
        ;;
      DEL)
        IFS= read -r key
        unset "$key"
        ;;
    esac
  done
}

_cenv_hook() {
  local diff
  diff="$(cenv env load)" || return 0
  [ -n "$diff" ] && _cenv_apply <<< "$diff"
  return 0
}

typeset -ag precmd_functions
if (( ! ${precmd_functions[(I)_cenv_hook]} )); then
  precmd_functions+=(_cenv_hook)
fi
"#;

const FISH_HOOK: &str = r#"function _cenv_hook --on-event fish_prompt
  cenv env load | while read -l op
    switch $op
      case SET
        read -l key
        read -l value
        set -gx $key $value
      case DEL
        read -l key
        set -e $key
    end
  end
end
"#;

const POWERSHELL_HOOK: &str = r#"function global:Invoke-CenvHook {
  $diff = @(& cenv env load)
  if ($LASTEXITCODE -ne 0) { return }
  $i = 0
  while ($i -lt $diff.Count) {
    switch ($diff[$i]) {
      'SET' {
        [Environment]::SetEnvironmentVariable($diff[$i + 1], $diff[$i + 2], 'Process')
        $i += 3
      }
      'DEL' {
        Remove-Item -Path ("Env:" + $diff[$i + 1]) -ErrorAction SilentlyContinue
        $i += 2
      }
      default { $i += 1 }
    }
  }
}

$global:CenvPreviousPrompt = $function:prompt
function global:prompt {
  Invoke-CenvHook
  & $global:CenvPreviousPrompt
}
"#;
