use colored::*;

/// Turns common compiler/linker failures into a hint about directives.
pub struct FeedbackAnalyzer;

impl FeedbackAnalyzer {
    pub fn analyze(output: &str) -> Option<String> {
        // 1. Program without an entry point
        if output.contains("undefined reference to `main'")
            || output.contains("undefined reference to 'main'")
            || output.contains("_main\", referenced from")
        {
            return Some(format!(
                "Your program is missing a {} function.\nEvery top-level {} file is built as a program.\nMove library code into a module directory.",
                "main()".bold().yellow(),
                ".c".bold().yellow()
            ));
        }

        // 2. Symbol defined in a module that was never linked
        if output.contains("undefined reference to") || output.contains("Undefined symbols") {
            return Some(format!(
                "It looks like a {} error.\nThe module defining the symbol is probably not in the program's closure.\nAdd {} to the program or to the header of the module that needs it.",
                "Linker".bold().red(),
                "//> use: <module>".bold().green()
            ));
        }

        // 3. Missing header
        if output.contains("fatal error: ")
            && (output.contains("No such file or directory") || output.contains("file not found"))
        {
            return Some(format!(
                "It looks like a {} error.\nIncludes are resolved from the source root, e.g. {}.\nCheck the module directory exists and its header is named correctly.",
                "Missing Header".bold().red(),
                "#include \"net/net.h\"".bold().yellow()
            ));
        }

        None
    }
}
