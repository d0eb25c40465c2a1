use std::path::PathBuf;

xflags::xflags! {
    /// Query and convert linked data held in N-Triples files.
    cmd lugh {
        /// Evaluate a graph path against the top nodes of a file.
        cmd query {
            /// N-Triples file to read
            required input: PathBuf
            /// Graph path, e.g. `ex:knows ex:name`
            required path: String
            /// Configuration file, `lugh.toml` in the working directory if present
            optional -c, --config config: PathBuf
            /// Extra prefix binding as `prefix=namespace`
            repeated -p, --prefix prefix: String
            /// Print the result as JSON
            optional --json
        }
        /// Print the nodes of a file.
        cmd dump {
            /// N-Triples file to read
            required input: PathBuf
            /// Configuration file, `lugh.toml` in the working directory if present
            optional -c, --config config: PathBuf
            /// Move typed sequence entries under their type
            optional --unordered
            /// Print the nodes as JSON
            optional --json
            /// Print the nodes as one XML document
            optional --xml
            /// Print every subject node, not only the top ones
            optional --all
        }
        /// Read a file and write it back as N-Triples.
        cmd export {
            /// N-Triples file to read
            required input: PathBuf
        }
    }
}
